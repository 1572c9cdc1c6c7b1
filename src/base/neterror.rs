use std::time::Duration;
use thiserror::Error;

/// Broad classification of a [`NetError`].
///
/// Callers (and middlewares) usually branch on the kind rather than on the
/// individual variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input detected before any I/O. Never retried.
    Configuration,
    /// Dial failure, read failure, proxy negotiation failure.
    Connection,
    /// A configured timeout elapsed while waiting on the socket.
    Timeout,
    /// The redirect limit was exceeded.
    RedirectLimit,
    /// A body codec could not encode or decode a payload.
    Codec,
}

#[derive(Debug, Error)]
pub enum NetError {
    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Unsupported protocol version HTTP/{0}")]
    UnsupportedVersion(String),

    // Connection Errors
    #[error("Connection to {host}:{port} failed: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        code: Option<i32>,
        message: String,
    },
    #[error("Name not resolved: {domain}: {message}")]
    NameNotResolved { domain: String, message: String },
    #[error("Connection error: {message}")]
    Connection {
        code: Option<i32>,
        message: String,
    },
    #[error("SSL handshake with {host} failed: {message}")]
    SslHandshake { host: String, message: String },
    #[error("Connection timed out after {0:?}")]
    ConnectionTimedOut(Duration),

    // Redirects
    #[error("Too many redirects for {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: u32 },

    // Body handling
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Content decoding failed: {0}")]
    ContentDecodingFailed(String),
}

impl NetError {
    /// Generic connection error without an OS code.
    pub fn connection(message: impl Into<String>) -> Self {
        NetError::Connection {
            code: None,
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        NetError::InvalidConfig(message.into())
    }

    pub fn codec(message: impl Into<String>) -> Self {
        NetError::Codec(message.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::InvalidConfig(_)
            | NetError::InvalidUrl(_)
            | NetError::InvalidHeader(_)
            | NetError::UnsupportedVersion(_) => ErrorKind::Configuration,
            NetError::ConnectionFailed { .. }
            | NetError::NameNotResolved { .. }
            | NetError::Connection { .. }
            | NetError::SslHandshake { .. } => ErrorKind::Connection,
            NetError::ConnectionTimedOut(_) => ErrorKind::Timeout,
            NetError::TooManyRedirects { .. } => ErrorKind::RedirectLimit,
            NetError::Codec(_) | NetError::ContentDecodingFailed(_) => ErrorKind::Codec,
        }
    }

    /// Whether a caller may reasonably send the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Connection | ErrorKind::Timeout)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// OS-level error code, when the failure came from the socket layer.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            NetError::ConnectionFailed { code, .. } | NetError::Connection { code, .. } => *code,
            _ => None,
        }
    }

    /// Chromium-style numeric code (see `net_error_list.h`).
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionFailed { .. } => -104,
            NetError::NameNotResolved { .. } => -105,
            NetError::SslHandshake { .. } => -107,
            NetError::Connection { .. } => -100,
            NetError::ConnectionTimedOut(_) => -118,
            NetError::InvalidUrl(_) => -300,
            NetError::TooManyRedirects { .. } => -310,
            NetError::ContentDecodingFailed(_) => -330,
            NetError::InvalidHeader(_) => -1001,
            NetError::InvalidConfig(_) => -1002,
            NetError::UnsupportedVersion(_) => -1003,
            NetError::Codec(_) => -1004,
        }
    }
}
