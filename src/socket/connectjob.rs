use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::uri::Uri;
use crate::socket::proxy::{Proxy, ProxyType};
use crate::socket::socks5::Socks5Tunnel;
use crate::socket::stream::{Connection, SocketType};
use crate::socket::tls::{self, TlsConfig};
use crate::socket::tunnel::HttpConnectTunnel;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// Manages the connection process: DNS -> TCP -> proxy tunnel -> TLS.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob<'a> {
    config: &'a Config,
    request: &'a Request,
}

impl<'a> ConnectJob<'a> {
    pub fn new(config: &'a Config, request: &'a Request) -> Self {
        Self { config, request }
    }

    /// Open a connection for the request.
    ///
    /// Returns the ready connection and, when a proxy tunnel was negotiated,
    /// the proxy's response head.
    pub async fn connect(&self) -> Result<(Connection, Option<Response>), NetError> {
        let uri = self.request.uri();
        let host = uri
            .host()
            .ok_or_else(|| NetError::InvalidUrl(format!("{uri}: missing host")))?;

        match self.request.proxy() {
            Some(proxy) => {
                let conn = self.dial_proxy(proxy).await?;
                let tunnel = match proxy.kind() {
                    ProxyType::Http => {
                        HttpConnectTunnel::new(conn, self.config, self.request, proxy)
                            .connect()
                            .await?
                    }
                    ProxyType::Socks5 => {
                        Socks5Tunnel::new(conn, self.config, self.request, proxy)
                            .connect()
                            .await?
                    }
                };
                Ok((tunnel.connection, Some(tunnel.response)))
            }
            None => {
                let port = uri.port_or_default();
                let stream = dial(host, port, self.config.timeout).await?;
                let conn = Connection::new(SocketType::Tcp(stream), self.config.timeout);
                Ok((secure_if_needed(conn, uri, self.config).await?, None))
            }
        }
    }

    async fn dial_proxy(&self, proxy: &Proxy) -> Result<Connection, NetError> {
        tracing::debug!(proxy = %proxy.host(), port = proxy.port(), kind = ?proxy.kind(), "Dialing proxy");
        let stream = dial(proxy.host(), proxy.port(), self.config.timeout).await?;
        Ok(Connection::new(SocketType::Tcp(stream), self.config.timeout))
    }
}

/// Literal IPs are used as-is; anything else goes through the system resolver.
pub async fn resolve(host: &str, port: u16, timeout: Duration) -> Result<Vec<SocketAddr>, NetError> {
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs: Vec<SocketAddr> = tokio::time::timeout(timeout, tokio::net::lookup_host((host, port)))
        .await
        .map_err(|_| NetError::ConnectionTimedOut(timeout))?
        .dns_context(host)?
        .collect();

    if addrs.is_empty() {
        return Err(NetError::NameNotResolved {
            domain: host.to_string(),
            message: "no addresses".to_string(),
        });
    }
    Ok(addrs)
}

/// TCP connect to the first reachable address of `host:port`.
pub async fn dial(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, NetError> {
    let addrs = resolve(host, port, timeout).await?;

    let mut last_err = None;
    for addr in addrs {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                tracing::debug!(host, %addr, "Connected");
                return Ok(stream);
            }
            Ok(Err(e)) => {
                tracing::debug!(host, %addr, error = %e, "Connect attempt failed");
                last_err = Some(Err::<TcpStream, _>(e).connection_context(host, port));
            }
            Err(_) => last_err = Some(Err(NetError::ConnectionTimedOut(timeout))),
        }
    }

    last_err.unwrap_or_else(|| {
        Err(NetError::ConnectionFailed {
            host: host.to_string(),
            port,
            code: None,
            message: "no addresses to connect to".to_string(),
        })
    })
}

/// Wrap the connection in TLS when the target is https.
pub async fn secure_if_needed(conn: Connection, uri: &Uri, config: &Config) -> Result<Connection, NetError> {
    if !uri.is_https() || conn.is_tls() {
        return Ok(conn);
    }
    let host = uri
        .host()
        .ok_or_else(|| NetError::InvalidUrl(format!("{uri}: missing host")))?;
    let timeout = conn.timeout();

    match conn.into_socket()? {
        SocketType::Tcp(stream) => {
            let tls_config = TlsConfig::with_verify(config.ssl_verify);
            let ssl = tls::upgrade(stream, host, &tls_config, timeout).await?;
            Ok(Connection::new(SocketType::Ssl(ssl), timeout))
        }
        socket @ SocketType::Ssl(_) => Ok(Connection::new(socket, timeout)),
    }
}
