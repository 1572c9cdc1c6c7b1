use super::redirect::{redirected, RedirectPolicy};
use super::{attach_body, fill_transport_headers, has_no_body, seed_from_tunnel, Handler};
use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::wire;
use crate::socket::connectjob::ConnectJob;
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;

/// Delegates HTTP/1 framing to hyper over a connection from [`ConnectJob`].
///
/// Redirects, content decoding and the empty-response guard behave exactly
/// as in [`SocketHandler`](super::SocketHandler).
#[derive(Debug, Clone)]
pub struct EngineHandler {
    config: Config,
}

impl EngineHandler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn execute(&self, request: Request) -> Result<Response, NetError> {
        request.version().ensure_supported()?;

        let policy = RedirectPolicy::from_config(&self.config);
        let original = request.uri().clone();
        let mut request = fill_transport_headers(&request)?;
        let mut response = Response::new();
        let mut followed = 0;

        let incoming = loop {
            let incoming = self.exchange(&request, &mut response).await?;

            match policy.next_hop(request.uri(), &response, followed, &original)? {
                Some(target) => {
                    drop(incoming);
                    response.keep_only_set_cookie();
                    followed += 1;
                    request = redirected(&request, target)?;
                }
                None => break incoming,
            }
        };

        let raw = if has_no_body(request.method(), response.status()) {
            Bytes::new()
        } else {
            self.collect(incoming).await?
        };
        attach_body(&mut response, raw)?;
        response.set_uri(request.uri().clone());

        tracing::debug!(
            url = %request.uri(),
            status = response.status(),
            bytes = response.body().len(),
            redirects = followed,
            "Request complete"
        );
        Ok(response)
    }

    /// Send one request and capture the response head into `response`.
    async fn exchange(&self, request: &Request, response: &mut Response) -> Result<Incoming, NetError> {
        let timeout = self.config.timeout;
        let (conn, tunnel) = ConnectJob::new(&self.config, request).connect().await?;
        seed_from_tunnel(response, tunnel)?;
        let io = TokioIo::new(conn.into_socket()?);

        let (mut sender, driver) = tokio::time::timeout(timeout, http1::handshake(io))
            .await
            .map_err(|_| NetError::ConnectionTimedOut(timeout))?
            .map_err(engine_error)?;
        tokio::spawn(async move {
            if let Err(e) = driver.await {
                tracing::debug!(error = %e, "Connection driver ended");
            }
        });

        let outgoing = build_request(request)?;
        let resp = tokio::time::timeout(timeout, sender.send_request(outgoing))
            .await
            .map_err(|_| NetError::ConnectionTimedOut(timeout))?
            .map_err(engine_error)?;

        let (parts, body) = resp.into_parts();
        for line in head_lines(&parts) {
            if !wire::apply_head_line(response, &line) {
                break;
            }
        }
        Ok(body)
    }

    async fn collect(&self, body: Incoming) -> Result<Bytes, NetError> {
        let timeout = self.config.timeout;
        let collected = tokio::time::timeout(timeout, body.collect())
            .await
            .map_err(|_| NetError::ConnectionTimedOut(timeout))?
            .map_err(engine_error)?;
        Ok(collected.to_bytes())
    }
}

impl Handler for EngineHandler {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, NetError>> {
        Box::pin(self.execute(request))
    }
}

fn engine_error(e: hyper::Error) -> NetError {
    NetError::connection(format!("engine: {e}"))
}

fn build_request(request: &Request) -> Result<http::Request<Full<Bytes>>, NetError> {
    let mut builder = http::Request::builder()
        .method(http::Method::from(request.method()))
        .uri(request.uri().request_target())
        .version(request.version().into());
    if let Some(headers) = builder.headers_mut() {
        *headers = request.headers().to_header_map()?;
    }
    builder
        .body(Full::new(request.body().bytes().clone()))
        .map_err(|e| NetError::InvalidUrl(format!("{}: {e}", request.uri())))
}

/// Render hyper's parsed head back into wire lines, ending with the blank
/// line, so it goes through the same line grammar as the raw handler.
fn head_lines(parts: &http::response::Parts) -> Vec<String> {
    let version = match parts.version {
        http::Version::HTTP_10 => "1.0",
        _ => "1.1",
    };
    let mut lines = Vec::with_capacity(parts.headers.len() + 2);
    lines.push(format!(
        "HTTP/{} {} {}\r\n",
        version,
        parts.status.as_u16(),
        parts.status.canonical_reason().unwrap_or("")
    ));
    for (name, value) in &parts.headers {
        lines.push(format!(
            "{}: {}\r\n",
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
    lines.push("\r\n".to_string());
    lines
}
