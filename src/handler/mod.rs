//! Transport handlers: turn a fully prepared [`Request`] into a [`Response`].
//!
//! - [`socket::SocketHandler`]: writes HTTP/1.x by hand over the connection
//!   from [`ConnectJob`](crate::socket::connectjob::ConnectJob)
//! - [`engine::EngineHandler`]: hands the same connection to hyper's HTTP/1
//!   client
//!
//! Both follow redirects with [`redirect::RedirectPolicy`] and decode the
//! body the same way.

pub mod engine;
pub mod redirect;
pub mod socket;

use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::decode::{decode_content, split_content_type};
use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::response::Response;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;

pub use engine::EngineHandler;
pub use redirect::RedirectPolicy;
pub use socket::SocketHandler;

pub trait Handler: Send + Sync {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, NetError>>;
}

/// Builds the handler a client uses for each request.
pub type HandlerFactory = Arc<dyn Fn(&Config) -> Arc<dyn Handler> + Send + Sync>;

pub fn socket_handler() -> HandlerFactory {
    Arc::new(|config: &Config| Arc::new(SocketHandler::new(config.clone())) as Arc<dyn Handler>)
}

pub fn engine_handler() -> HandlerFactory {
    Arc::new(|config: &Config| Arc::new(EngineHandler::new(config.clone())) as Arc<dyn Handler>)
}

/// Responses that never carry a body.
pub(crate) fn has_no_body(method: Method, status: u16) -> bool {
    method == Method::Head || (100..200).contains(&status) || status == 204 || status == 304
}

/// Interim 1xx heads that precede the real one.
pub(crate) fn is_interim(status: u16) -> bool {
    (100..200).contains(&status) && status != 101
}

/// `Host` and `Content-Length` for requests that reach a handler without them.
pub(crate) fn fill_transport_headers(request: &Request) -> Result<Request, NetError> {
    let mut request = request.clone();
    if !request.headers().contains("Host") {
        let uri = request.uri();
        let authority = uri
            .authority()
            .ok_or_else(|| NetError::InvalidUrl(format!("{uri}: missing host")))?;
        request.headers_mut().set("Host", &authority)?;
    }
    if !request.body().is_empty() && !request.headers().contains("Content-Length") {
        let len = request.body().len().to_string();
        request.headers_mut().set("Content-Length", &len)?;
    }
    Ok(request)
}

/// Headers that describe a message body; kept off the origin response
/// when it is seeded from a proxy reply.
const BODY_HEADERS: [&str; 4] = ["Content-Length", "Transfer-Encoding", "Content-Encoding", "Content-Type"];

/// Start `response` from the proxy's answer to the tunnel request.
///
/// The origin head read afterwards overwrites the status and appends its
/// own headers.
pub(crate) fn seed_from_tunnel(response: &mut Response, tunnel: Option<Response>) -> Result<(), NetError> {
    let Some(tunnel) = tunnel else {
        return Ok(());
    };
    if tunnel.status() != 0 {
        response.set_version(tunnel.version().to_string());
        response.set_status(tunnel.status(), tunnel.reason().to_string());
    }
    for header in tunnel.headers().iter() {
        if BODY_HEADERS.iter().any(|name| header.is(name)) {
            continue;
        }
        response
            .headers_mut()
            .append(header.name(), header.value().unwrap_or(""))?;
    }
    Ok(())
}

/// Undo the content encoding and record body, MIME type and charset.
pub(crate) fn attach_body(response: &mut Response, raw: Bytes) -> Result<(), NetError> {
    let body = decode_content(response.header("Content-Encoding"), raw)?;
    response.set_body(body);

    match response.header("Content-Type").map(split_content_type) {
        Some((mime, charset)) => response.set_content_type(Some(mime), charset),
        None => response.set_content_type(None, None),
    }

    if response.is_blank() {
        return Err(NetError::connection("empty server response"));
    }
    Ok(())
}
