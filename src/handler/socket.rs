use super::redirect::{redirected, RedirectPolicy};
use super::{attach_body, fill_transport_headers, has_no_body, is_interim, seed_from_tunnel, Handler};
use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::wire;
use crate::socket::connectjob::ConnectJob;
use crate::socket::stream::Connection;
use bytes::Bytes;
use futures::future::BoxFuture;

/// HTTP/1.x written and parsed by hand over a [`Connection`].
///
/// One connection per hop; every connection is closed before `send`
/// returns, on success and on error.
#[derive(Debug, Clone)]
pub struct SocketHandler {
    config: Config,
}

impl SocketHandler {
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

        let mut conn = loop {
            let mut conn = self.exchange(&request, &mut response).await?;

            match policy.next_hop(request.uri(), &response, followed, &original) {
                Ok(Some(target)) => {
                    conn.close().await;
                    response.keep_only_set_cookie();
                    followed += 1;
                    request = redirected(&request, target)?;
                }
                Ok(None) => break conn,
                Err(e) => {
                    conn.close().await;
                    return Err(e);
                }
            }
        };

        let raw = read_body(&mut conn, &request, &response).await;
        conn.close().await;
        attach_body(&mut response, raw?)?;
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

    /// Connect, write the request and read the response head.
    async fn exchange(&self, request: &Request, response: &mut Response) -> Result<Connection, NetError> {
        let (mut conn, tunnel) = ConnectJob::new(&self.config, request).connect().await?;
        if let Err(e) = seed_from_tunnel(response, tunnel) {
            conn.close().await;
            return Err(e);
        }

        conn.write_all(&serialize(request)).await?;
        wire::read_head(&mut conn, response).await?;
        while is_interim(response.status()) {
            tracing::trace!(status = response.status(), "Skipping interim response");
            wire::read_head(&mut conn, response).await?;
        }
        Ok(conn)
    }
}

impl Handler for SocketHandler {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, NetError>> {
        Box::pin(self.execute(request))
    }
}

/// Request line, headers, blank line and body.
pub fn serialize(request: &Request) -> Vec<u8> {
    let head = format!(
        "{} {} HTTP/{}\r\n{}\r\n",
        request.method(),
        request.uri().request_target(),
        request.version().as_str(),
        request.headers().to_wire()
    );
    let body = request.body().bytes();
    let mut out = Vec::with_capacity(head.len() + body.len());
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(body);
    out
}

/// Body framing: chunked, then Content-Length, then read until EOF.
async fn read_body(conn: &mut Connection, request: &Request, response: &Response) -> Result<Bytes, NetError> {
    if has_no_body(request.method(), response.status()) {
        return Ok(Bytes::new());
    }

    let chunked = response
        .headers()
        .get_all("Transfer-Encoding")
        .any(|v| v.to_ascii_lowercase().contains("chunked"));
    if chunked {
        return wire::read_chunked(conn).await;
    }

    match response.header("Content-Length").map(|v| v.trim().parse::<usize>()) {
        Some(Ok(len)) => wire::read_content_length(conn, len).await,
        Some(Err(_)) => Err(NetError::connection("invalid Content-Length")),
        None => wire::read_to_eof(conn).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::method::Method;

    #[test]
    fn test_serialize() {
        let req = Request::parse(Method::Post, "http://example.com/submit?x=1")
            .unwrap()
            .with_header("Host", "example.com")
            .unwrap()
            .with_body("hi".into());
        let wire = String::from_utf8(serialize(&req)).unwrap();
        assert_eq!(wire, "POST /submit?x=1 HTTP/1.1\r\nHost: example.com\r\n\r\nhi");
    }
}
