//! SOCKS5 handshake (RFC 1928) with username/password auth (RFC 1929).

use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::socket::proxy::Proxy;
use crate::socket::stream::Connection;
use crate::socket::Tunnel;
use std::net::IpAddr;

const VERSION: u8 = 0x05;
const AUTH_VERSION: u8 = 0x01;

const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USER_PASS: u8 = 0x02;
const METHOD_NONE_ACCEPTABLE: u8 = 0xff;

const CMD_CONNECT: u8 = 0x01;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Method negotiation frame.
pub fn greeting(with_auth: bool) -> Vec<u8> {
    if with_auth {
        vec![VERSION, 2, METHOD_NO_AUTH, METHOD_USER_PASS]
    } else {
        vec![VERSION, 1, METHOD_NO_AUTH]
    }
}

/// Username/password sub-negotiation frame.
pub fn auth_frame(user: &str, pass: &str) -> Result<Vec<u8>, NetError> {
    let ulen = u8::try_from(user.len())
        .map_err(|_| NetError::invalid_config("SOCKS5 username longer than 255 bytes"))?;
    let plen = u8::try_from(pass.len())
        .map_err(|_| NetError::invalid_config("SOCKS5 password longer than 255 bytes"))?;

    let mut frame = Vec::with_capacity(3 + user.len() + pass.len());
    frame.push(AUTH_VERSION);
    frame.push(ulen);
    frame.extend_from_slice(user.as_bytes());
    frame.push(plen);
    frame.extend_from_slice(pass.as_bytes());
    Ok(frame)
}

/// CONNECT request frame for `host:port`.
pub fn connect_frame(host: &str, port: u16) -> Result<Vec<u8>, NetError> {
    let mut frame = vec![VERSION, CMD_CONNECT, 0x00];
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            frame.push(ATYP_IPV4);
            frame.extend_from_slice(&ip.octets());
        }
        Ok(IpAddr::V6(ip)) => {
            frame.push(ATYP_IPV6);
            frame.extend_from_slice(&ip.octets());
        }
        Err(_) => {
            let len = u8::try_from(host.len())
                .map_err(|_| NetError::invalid_config("SOCKS5 domain longer than 255 bytes"))?;
            frame.push(ATYP_DOMAIN);
            frame.push(len);
            frame.extend_from_slice(host.as_bytes());
        }
    }
    frame.extend_from_slice(&port.to_be_bytes());
    Ok(frame)
}

/// Opens a tunnel through a SOCKS5 proxy.
pub struct Socks5Tunnel<'a> {
    conn: Connection,
    config: &'a Config,
    request: &'a Request,
    proxy: &'a Proxy,
}

impl<'a> Socks5Tunnel<'a> {
    /// `conn` must already be connected to the proxy.
    pub fn new(conn: Connection, config: &'a Config, request: &'a Request, proxy: &'a Proxy) -> Self {
        Self {
            conn,
            config,
            request,
            proxy,
        }
    }

    async fn fail<T>(&mut self, message: impl Into<String>) -> Result<T, NetError> {
        self.conn.close().await;
        Err(NetError::connection(message))
    }

    pub async fn connect(mut self) -> Result<Tunnel, NetError> {
        let (config, request, proxy) = (self.config, self.request, self.proxy);
        let uri = request.uri();
        let host = uri
            .host()
            .ok_or_else(|| NetError::InvalidUrl(format!("{uri}: missing host")))?
            .to_string();
        let port = uri.port_or_default();
        let credentials = proxy.credentials();

        self.conn.write_all(&greeting(credentials.is_some())).await?;
        let choice = self.conn.read_exact(2).await?;
        if choice[0] != VERSION {
            return self.fail("invalid SOCKS response").await;
        }

        match (choice[1], credentials) {
            (METHOD_NO_AUTH, _) => {}
            (METHOD_USER_PASS, Some((user, pass))) => {
                let frame = auth_frame(user, pass)?;
                self.conn.write_all(&frame).await?;
                let reply = self.conn.read_exact(2).await?;
                if reply[0] != AUTH_VERSION || reply[1] != 0x00 {
                    tracing::debug!(proxy = %proxy.host(), status = reply[1], "SOCKS5 auth rejected");
                    return self.fail("SOCKS5 authentication failed").await;
                }
            }
            (METHOD_NONE_ACCEPTABLE, _) => {
                return self.fail("SOCKS5 proxy accepted none of the offered auth methods").await;
            }
            (other, _) => {
                return self
                    .fail(format!("SOCKS5 proxy selected unsupported method {other:#04x}"))
                    .await;
            }
        }

        self.conn.write_all(&connect_frame(&host, port)?).await?;
        let head = self.conn.read_exact(4).await?;
        if head[0] != VERSION || head[1] != 0x00 || head[2] != 0x00 {
            tracing::debug!(proxy = %proxy.host(), reply = head[1], "SOCKS5 connect rejected");
            return self.fail("invalid SOCKS response").await;
        }

        // Skip BND.ADDR and BND.PORT.
        let skip = match head[3] {
            ATYP_IPV4 => 4 + 2,
            ATYP_IPV6 => 16 + 2,
            ATYP_DOMAIN => {
                let len = self.conn.read_exact(1).await?;
                len[0] as usize + 2
            }
            other => {
                return self
                    .fail(format!("invalid SOCKS address type {other:#04x}"))
                    .await;
            }
        };
        self.conn.read_exact(skip).await?;

        tracing::debug!(proxy = %proxy.host(), target = %host, port, "SOCKS5 tunnel established");

        let connection = super::connectjob::secure_if_needed(self.conn, uri, config).await?;
        Ok(Tunnel {
            connection,
            response: Response::new(),
        })
    }
}
