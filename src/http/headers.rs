use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;
use std::str::FromStr;

/// A single header. Name casing is preserved but matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: Option<String>,
}

impl Header {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Result<Self, NetError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NetError::InvalidHeader("header name must not be empty".into()));
        }
        if name.contains(['\r', '\n', ':']) {
            return Err(NetError::InvalidHeader(format!("invalid header name {name:?}")));
        }
        if let Some(v) = &value {
            if v.contains(['\r', '\n']) {
                return Err(NetError::InvalidHeader(format!("invalid value for {name}")));
            }
        }
        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// `Name: value` without the line terminator.
    pub fn line(&self) -> String {
        format!("{}: {}", self.name, self.value.as_deref().unwrap_or(""))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line())
    }
}

/// Order-preserving header multimap.
///
/// Lookups are case-insensitive; insertion order and original casing are
/// kept so the request goes out exactly as it was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    headers: Vec<Header>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Append a header, keeping any existing ones with the same name.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        self.headers
            .push(Header::new(name, Some(value.to_string()))?);
        Ok(())
    }

    /// Replace every header with this name by a single one.
    ///
    /// The first existing occurrence keeps its position.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let header = Header::new(name, Some(value.to_string()))?;
        match self.headers.iter().position(|h| h.is(name)) {
            Some(idx) => {
                self.headers[idx] = header;
                let mut seen = false;
                self.headers.retain(|h| {
                    if !h.is(name) {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.headers.push(header),
        }
        Ok(())
    }

    /// Set a header only when absent.
    pub fn set_default(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        if self.contains(name) {
            return Ok(());
        }
        self.append(name, value)
    }

    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|h| !h.is(name));
    }

    pub fn retain<F: FnMut(&Header) -> bool>(&mut self, f: F) {
        self.headers.retain(f);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.is(name))
    }

    /// First value for the header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .and_then(|h| h.value())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.is(name))
            .filter_map(|h| h.value())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Header section lines, each terminated with CRLF.
    pub fn to_wire(&self) -> String {
        self.headers
            .iter()
            .map(|h| format!("{}\r\n", h.line()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Convert into an `http::HeaderMap` for the hyper engine.
    pub fn to_header_map(&self) -> Result<HeaderMap, NetError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for h in &self.headers {
            let name = HeaderName::from_str(h.name())
                .map_err(|_| NetError::InvalidHeader(h.name().to_string()))?;
            let value = HeaderValue::from_str(h.value().unwrap_or(""))
                .map_err(|_| NetError::InvalidHeader(h.name().to_string()))?;
            map.append(name, value);
        }
        Ok(map)
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut headers = HeaderList::new();
        headers.append("Content-Type", "application/json").unwrap();
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_multimap() {
        let mut headers = HeaderList::new();
        headers.append("Set-Cookie", "a=1").unwrap();
        headers.append("set-cookie", "b=2").unwrap();
        let all: Vec<_> = headers.get_all("Set-Cookie").collect();
        assert_eq!(all, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut headers = HeaderList::new();
        headers.append("Host", "a.com").unwrap();
        headers.append("Accept", "*/*").unwrap();
        headers.append("host", "b.com").unwrap();
        headers.set("HOST", "c.com").unwrap();

        assert_eq!(headers.len(), 2);
        let names: Vec<_> = headers.iter().map(|h| h.name().to_string()).collect();
        assert_eq!(names, vec!["HOST", "Accept"]);
        assert_eq!(headers.get("host"), Some("c.com"));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut headers = HeaderList::new();
        headers.append("Connection", "keep-alive").unwrap();
        headers.set_default("connection", "close").unwrap();
        assert_eq!(headers.get("Connection"), Some("keep-alive"));
    }

    #[test]
    fn test_preserves_case_on_wire() {
        let mut headers = HeaderList::new();
        headers.append("X-Custom-Thing", "1").unwrap();
        headers.append("accept", "text/html").unwrap();
        assert_eq!(headers.to_wire(), "X-Custom-Thing: 1\r\naccept: text/html\r\n");
    }

    #[test]
    fn test_invalid_header() {
        let mut headers = HeaderList::new();
        assert!(headers.append("", "value").is_err());
        assert!(headers.append("Valid", "bad\r\nvalue").is_err());
    }

    #[test]
    fn test_remove() {
        let mut headers = HeaderList::new();
        headers.append("X-A", "1").unwrap();
        headers.append("x-a", "2").unwrap();
        headers.remove("X-a");
        assert!(headers.is_empty());
    }
}
