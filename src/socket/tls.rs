use crate::base::neterror::NetError;
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// TLS client settings applied to every handshake.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub verify: bool,
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify: true,
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: vec!["http/1.1".to_string()],
        }
    }
}

impl TlsConfig {
    pub fn with_verify(verify: bool) -> Self {
        Self {
            verify,
            ..Self::default()
        }
    }

    fn connector(&self) -> Result<SslConnector, NetError> {
        let ssl_err = |e: boring::error::ErrorStack| NetError::SslHandshake {
            host: String::new(),
            message: e.to_string(),
        };

        let mut builder = SslConnector::builder(SslMethod::tls()).map_err(ssl_err)?;
        builder.set_min_proto_version(self.min_version).map_err(ssl_err)?;
        builder.set_max_proto_version(self.max_version).map_err(ssl_err)?;

        if !self.alpn_protos.is_empty() {
            let mut wire = Vec::new();
            for proto in &self.alpn_protos {
                let len = u8::try_from(proto.len())
                    .map_err(|_| NetError::invalid_config(format!("ALPN protocol too long: {proto}")))?;
                wire.push(len);
                wire.extend_from_slice(proto.as_bytes());
            }
            builder.set_alpn_protos(&wire).map_err(ssl_err)?;
        }

        builder.set_verify(if self.verify {
            SslVerifyMode::PEER
        } else {
            SslVerifyMode::NONE
        });

        Ok(builder.build())
    }

    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}

/// Run a TLS handshake for `host` over an established TCP stream.
pub async fn upgrade(
    stream: TcpStream,
    host: &str,
    config: &TlsConfig,
    timeout: Duration,
) -> Result<SslStream<TcpStream>, NetError> {
    let connector = config.connector()?;
    let mut ssl = connector.configure().map_err(|e| NetError::SslHandshake {
        host: host.to_string(),
        message: e.to_string(),
    })?;

    let sni = TlsConfig::should_set_sni(host);
    ssl.set_use_server_name_indication(sni);
    ssl.set_verify_hostname(config.verify);

    tracing::debug!(host, sni, verify = config.verify, "TLS handshake");
    match tokio::time::timeout(timeout, tokio_boring::connect(ssl, host, stream)).await {
        Ok(Ok(s)) => Ok(s),
        Ok(Err(e)) => Err(NetError::SslHandshake {
            host: host.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(NetError::ConnectionTimedOut(timeout)),
    }
}
