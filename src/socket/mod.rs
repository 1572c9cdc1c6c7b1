//! Sockets and connection setup.
//!
//! - [`connectjob`]: DNS → TCP → proxy tunnel → TLS connection flow
//! - [`stream`]: owned connection handle with timeouts
//! - [`proxy`]: proxy descriptor
//! - [`tunnel`] / [`socks5`]: HTTP CONNECT and SOCKS5 handshakes
//! - [`tls`]: TLS configuration with BoringSSL

pub mod connectjob;
pub mod proxy;
pub mod socks5;
pub mod stream;
pub mod tls;
pub mod tunnel;

use crate::http::response::Response;
use crate::socket::stream::Connection;

/// Result of a proxy handshake: the tunnelled connection (already wrapped
/// in TLS for https targets) and what the proxy answered.
#[derive(Debug)]
pub struct Tunnel {
    pub connection: Connection,
    pub response: Response,
}
