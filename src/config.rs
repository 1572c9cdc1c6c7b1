//! Client configuration.

use crate::base::neterror::NetError;
use crate::http::method::Version;
use crate::http::uri::Uri;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Content encodings the transports can decode.
pub const SUPPORTED_COMPRESSION: &[&str] = &["gzip", "deflate"];

/// Options shared by the client and its transport handlers.
///
/// Can be deserialized from JSON; `timeout` is given in seconds:
///
/// ```
/// use wirehttp::config::Config;
///
/// let config = Config::from_json(r#"{"timeout": 5, "compress": "gzip"}"#).unwrap();
/// assert_eq!(config.timeout.as_secs(), 5);
/// assert!(config.ssl_verify);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verify TLS certificates and host names.
    pub ssl_verify: bool,

    /// Applies to each connect, read and write.
    #[serde(serialize_with = "ser_secs", deserialize_with = "de_secs")]
    pub timeout: Duration,

    /// Value for `Accept-Encoding`; the response is decoded accordingly.
    pub compress: Option<String>,

    pub allow_redirects: bool,

    /// 0 means unlimited.
    pub max_redirects: u32,

    /// Keep a cookie jar and send matching cookies.
    pub cookie: bool,

    /// Merged into every request URI.
    pub prefix_url: Option<Uri>,

    /// Protocol version for requests that don't set one.
    pub version: Version,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssl_verify: true,
            timeout: Duration::from_secs(30),
            compress: None,
            allow_redirects: true,
            max_redirects: 10,
            cookie: true,
            prefix_url: None,
            version: Version::Http11,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| NetError::invalid_config(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NetError> {
        if self.timeout.is_zero() {
            return Err(NetError::invalid_config("timeout must be greater than zero"));
        }
        if let Some(compress) = &self.compress {
            if !SUPPORTED_COMPRESSION.contains(&compress.as_str()) {
                return Err(NetError::invalid_config(format!(
                    "unsupported compression {compress:?}"
                )));
            }
        }
        if let Some(prefix) = &self.prefix_url {
            if prefix.host().is_none() && prefix.path().is_empty() {
                return Err(NetError::invalid_config("prefix URL must not be empty"));
            }
        }
        Ok(())
    }

    pub fn with_ssl_verify(mut self, verify: bool) -> Self {
        self.ssl_verify = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_compress(mut self, compress: Option<&str>) -> Self {
        self.compress = compress.map(|c| c.trim().to_ascii_lowercase());
        self
    }

    pub fn with_allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    pub fn with_max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn with_cookie(mut self, enabled: bool) -> Self {
        self.cookie = enabled;
        self
    }

    pub fn with_prefix_url(mut self, prefix: &str) -> Result<Self, NetError> {
        self.prefix_url = Some(Uri::parse(prefix)?);
        Ok(self)
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }
}

fn ser_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn de_secs<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(d)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
