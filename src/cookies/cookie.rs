use crate::cookies::matching::default_path;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single cookie.
///
/// `expires` is a unix timestamp; `0` means no expiry (the cookie lives for
/// the session). `session` is client-local and never rendered as
/// `Expires`/`Max-Age`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// `None` matches any domain.
    pub domain: Option<String>,
    pub path: String,
    pub expires: i64,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub session: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: "/".to_string(),
            expires: 0,
            max_age: None,
            secure: false,
            http_only: false,
            session: false,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expires(mut self, expires: i64) -> Self {
        self.expires = expires;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_session(mut self, session: bool) -> Self {
        self.session = session;
        self
    }

    /// Parse a `Set-Cookie` header value.
    ///
    /// Recognised attributes: `Domain`, `Path`, `Expires`, `Max-Age`,
    /// `Secure`, `HttpOnly`. `Max-Age` wins over `Expires`. A cookie with
    /// neither is flagged as a session cookie.
    pub fn parse(line: &str) -> Option<Self> {
        let parsed = match cookie::Cookie::parse(line.trim().to_string()) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(line = %line, error = %e, "Failed to parse cookie");
                return None;
            }
        };

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let max_age = parsed.max_age().map(|d| d.whole_seconds());
        let expires = match max_age {
            Some(secs) => now.saturating_add(secs),
            None => parsed
                .expires_datetime()
                .map(|t| t.unix_timestamp())
                .unwrap_or(0),
        };

        let cookie = Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain: parsed
                .domain()
                .map(|d| d.trim_start_matches('.').to_string())
                .filter(|d| !d.is_empty()),
            path: parsed.path().unwrap_or("").to_string(),
            expires,
            max_age,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            session: max_age.is_none() && expires == 0,
        };
        cookie.is_valid().then_some(cookie)
    }

    /// Parse a `Set-Cookie` value received for `host` + `request_path`,
    /// defaulting a missing domain to the host and a missing or relative
    /// path to the directory of the request path.
    pub fn from_set_cookie(line: &str, host: &str, request_path: &str) -> Option<Self> {
        let mut cookie = Self::parse(line)?;
        if cookie.domain.is_none() {
            cookie.domain = Some(host.to_string());
        }
        if !cookie.path.starts_with('/') {
            cookie.path = default_path(request_path);
        }
        Some(cookie)
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && self.expires <= now
    }

    /// `name=value` as sent in a `Cookie` header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let mut builder = cookie::Cookie::build((self.name.clone(), self.value.clone()))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if !self.session {
            if let Some(secs) = self.max_age {
                builder = builder.max_age(time::Duration::seconds(secs));
            } else if self.expires != 0 {
                if let Ok(at) = OffsetDateTime::from_unix_timestamp(self.expires) {
                    builder = builder.expires(at);
                }
            }
        }
        builder.build().to_string()
    }
}
