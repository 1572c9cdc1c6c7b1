//! Request target URI.
//!
//! Absolute URIs are parsed with the `url` crate. Relative references
//! (`/path?query#frag`) are kept as-is so that a client-level prefix can be
//! merged in later.

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri {
    scheme: Option<String>,
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Uri {
    pub fn parse(input: &str) -> Result<Self, NetError> {
        let input = input.trim();
        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| NetError::InvalidUrl(format!("{input}: {e}")))?;
            return Ok(Self::from_url(&url));
        }

        let (rest, fragment) = match input.split_once('#') {
            Some((r, f)) => (r, Some(f.to_string())),
            None => (input, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (rest, None),
        };
        Ok(Self {
            path: path.to_string(),
            query,
            fragment,
            ..Self::default()
        })
    }

    pub fn from_url(url: &Url) -> Self {
        let host = match url.host() {
            Some(Host::Domain(d)) => Some(d.to_string()),
            Some(Host::Ipv4(ip)) => Some(ip.to_string()),
            Some(Host::Ipv6(ip)) => Some(ip.to_string()),
            None => None,
        };
        Self {
            scheme: Some(url.scheme().to_string()),
            user: Some(url.username().to_string()).filter(|u| !u.is_empty()),
            password: url.password().map(str::to_string),
            host,
            port: url.port(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        }
    }

    pub fn to_url(&self) -> Result<Url, NetError> {
        if self.host.is_none() {
            return Err(NetError::InvalidUrl(format!("{self}: missing host")));
        }
        Url::parse(&self.to_string()).map_err(|e| NetError::InvalidUrl(format!("{self}: {e}")))
    }

    /// Resolve a `Location` value against this URI.
    pub fn join(&self, location: &str) -> Result<Uri, NetError> {
        let base = self.to_url()?;
        let joined = base
            .join(location)
            .map_err(|e| NetError::InvalidUrl(format!("{location}: {e}")))?;
        Ok(Self::from_url(&joined))
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn is_https(&self) -> bool {
        self.scheme
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("https"))
    }

    /// Explicit port, or 443 for https and 80 otherwise.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(if self.is_https() { 443 } else { 80 })
    }

    /// Literal IP host, if the host is one.
    pub fn ip_host(&self) -> Option<IpAddr> {
        self.host.as_deref().and_then(|h| h.parse().ok())
    }

    /// Path and query as written on the request line.
    pub fn request_target(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match &self.query {
            Some(q) => format!("{path}?{q}"),
            None => path.to_string(),
        }
    }

    /// Value for the `Host` header: host plus any explicit port.
    pub fn authority(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        Some(match self.port {
            Some(p) => format!("{host}:{p}"),
            None => host,
        })
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into().to_ascii_lowercase());
        self
    }

    pub fn with_user(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    /// Merge a client-level prefix into this URI.
    ///
    /// Every component present on the prefix overrides ours, except the path
    /// which is prefix path + our path with a doubled slash collapsed.
    pub fn with_prefix(&self, prefix: &Uri) -> Uri {
        let mut merged = self.clone();
        if let Some(scheme) = &prefix.scheme {
            merged.scheme = Some(scheme.clone());
        }
        if prefix.user.is_some() {
            merged.user = prefix.user.clone();
            merged.password = prefix.password.clone();
        }
        if let Some(host) = &prefix.host {
            merged.host = Some(host.clone());
        }
        if let Some(port) = prefix.port {
            merged.port = Some(port);
        }
        let prefix_path = prefix.path.as_str();
        if !prefix_path.is_empty() && prefix_path != "/" {
            merged.path = if prefix_path.ends_with('/') && self.path.starts_with('/') {
                format!("{}{}", prefix_path, &self.path[1..])
            } else if !prefix_path.ends_with('/') && !self.path.starts_with('/') && !self.path.is_empty() {
                format!("{}/{}", prefix_path, self.path)
            } else {
                format!("{}{}", prefix_path, self.path)
            };
        }
        merged
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = self.authority() {
            f.write_str("//")?;
            if let Some(user) = &self.user {
                f.write_str(user)?;
                if let Some(pass) = &self.password {
                    write!(f, ":{pass}")?;
                }
                f.write_str("@")?;
            }
            f.write_str(&authority)?;
        }
        f.write_str(&self.path)?;
        if let Some(q) = &self.query {
            write!(f, "?{q}")?;
        }
        if let Some(frag) = &self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

impl TryFrom<String> for Uri {
    type Error = NetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Uri::parse(&s)
    }
}

impl From<Uri> for String {
    fn from(u: Uri) -> Self {
        u.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let uri = Uri::parse("https://user:pw@example.com:8443/a/b?x=1#top").unwrap();
        assert_eq!(uri.scheme(), Some("https"));
        assert_eq!(uri.user(), Some("user"));
        assert_eq!(uri.password(), Some("pw"));
        assert_eq!(uri.host(), Some("example.com"));
        assert_eq!(uri.port(), Some(8443));
        assert_eq!(uri.path(), "/a/b");
        assert_eq!(uri.query(), Some("x=1"));
        assert_eq!(uri.fragment(), Some("top"));
        assert_eq!(uri.request_target(), "/a/b?x=1");
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(Uri::parse("http://a.com/").unwrap().port_or_default(), 80);
        assert_eq!(Uri::parse("https://a.com/").unwrap().port_or_default(), 443);
        assert_eq!(Uri::parse("http://a.com:81/").unwrap().port_or_default(), 81);
    }

    #[test]
    fn test_parse_relative() {
        let uri = Uri::parse("/users?page=2").unwrap();
        assert_eq!(uri.host(), None);
        assert_eq!(uri.path(), "/users");
        assert_eq!(uri.query(), Some("page=2"));
        assert!(uri.to_url().is_err());
    }

    #[test]
    fn test_ip_host() {
        let v4 = Uri::parse("http://127.0.0.1:8080/").unwrap();
        assert!(v4.ip_host().is_some());
        let v6 = Uri::parse("http://[::1]:8080/").unwrap();
        assert_eq!(v6.host(), Some("::1"));
        assert_eq!(v6.authority().unwrap(), "[::1]:8080");
        assert!(Uri::parse("http://example.com/").unwrap().ip_host().is_none());
    }

    #[test]
    fn test_join_relative_location() {
        let base = Uri::parse("http://example.com/a/b").unwrap();
        let next = base.join("/new").unwrap();
        assert_eq!(next.to_string(), "http://example.com/new");
        let other = base.join("http://other.com/x").unwrap();
        assert_eq!(other.host(), Some("other.com"));
    }

    #[test]
    fn test_prefix_merge() {
        let prefix = Uri::parse("https://api.example.com:8443/v1/").unwrap();
        let merged = Uri::parse("/users?x=1").unwrap().with_prefix(&prefix);
        assert_eq!(merged.to_string(), "https://api.example.com:8443/v1/users?x=1");

        let prefix = Uri::parse("https://api.example.com/v1").unwrap();
        let merged = Uri::parse("http://ignored.com/users").unwrap().with_prefix(&prefix);
        assert_eq!(merged.host(), Some("api.example.com"));
        assert_eq!(merged.scheme(), Some("https"));
        assert_eq!(merged.path(), "/v1/users");
    }
}
