//! HTTP CONNECT tunnelling.

use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::wire;
use crate::socket::proxy::Proxy;
use crate::socket::stream::Connection;
use crate::socket::Tunnel;

/// Opens a tunnel through an HTTP proxy with `CONNECT host:port`.
pub struct HttpConnectTunnel<'a> {
    conn: Connection,
    config: &'a Config,
    request: &'a Request,
    proxy: &'a Proxy,
}

impl<'a> HttpConnectTunnel<'a> {
    /// `conn` must already be connected to the proxy.
    pub fn new(conn: Connection, config: &'a Config, request: &'a Request, proxy: &'a Proxy) -> Self {
        Self {
            conn,
            config,
            request,
            proxy,
        }
    }

    /// The CONNECT request sent to the proxy.
    pub fn handshake(&self) -> Result<String, NetError> {
        let uri = self.request.uri();
        let host = uri
            .host()
            .ok_or_else(|| NetError::InvalidUrl(format!("{uri}: missing host")))?;
        let target = if host.contains(':') {
            format!("[{host}]:{}", uri.port_or_default())
        } else {
            format!("{host}:{}", uri.port_or_default())
        };

        let mut out = format!(
            "CONNECT {target} HTTP/{}\r\nHost: {target}\r\n",
            self.request.version().as_str()
        );
        if let Some(auth) = self.proxy.authorization() {
            out.push_str(&format!("Proxy-Authorization: {auth}\r\n"));
        }
        out.push_str("Proxy-Connection: close\r\n\r\n");
        Ok(out)
    }

    /// Send CONNECT, check the proxy's answer and upgrade to TLS for https
    /// targets. The proxy's response head is returned with the tunnel.
    pub async fn connect(mut self) -> Result<Tunnel, NetError> {
        let (config, request) = (self.config, self.request);
        let handshake = self.handshake()?;
        self.conn.write_all(handshake.as_bytes()).await?;

        let mut response = Response::new();
        wire::read_head(&mut self.conn, &mut response).await?;

        tracing::debug!(
            proxy = %self.proxy.host(),
            status = response.status(),
            "CONNECT response"
        );

        match response.status() {
            200..=299 => {}
            407 => {
                self.conn.close().await;
                return Err(NetError::connection("proxy authentication required"));
            }
            0 => {
                self.conn.close().await;
                return Err(NetError::connection("proxy closed connection during CONNECT"));
            }
            status => {
                self.conn.close().await;
                return Err(NetError::connection(format!(
                    "proxy tunnel failed with status {status}"
                )));
            }
        }

        let connection = super::connectjob::secure_if_needed(self.conn, request.uri(), config).await?;
        Ok(Tunnel {
            connection,
            response,
        })
    }
}
