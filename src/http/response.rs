//! HTTP response as seen by callers and middlewares.

use crate::base::neterror::NetError;
use crate::cookies::cookie::Cookie;
use crate::http::headers::HeaderList;
use crate::http::uri::Uri;
use bytes::Bytes;
use serde_json::Value;

pub const DEFAULT_ENCODING: &str = "utf-8";

#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    reason: String,
    version: String,
    headers: HeaderList,
    cookies: Vec<Cookie>,
    body: Bytes,
    decoded: Option<Value>,
    content_type: Option<String>,
    encoding: String,
    uri: Option<Uri>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// An empty response: status 0, no headers, no body.
    pub fn new() -> Self {
        Self {
            status: 0,
            reason: String::new(),
            version: String::new(),
            headers: HeaderList::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            decoded: None,
            content_type: None,
            encoding: DEFAULT_ENCODING.to_string(),
            uri: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Protocol version as written after `HTTP/` (e.g. `1.1`).
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Raw body after transfer and content decoding.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed by the response codec for its content type, if any.
    pub fn decoded(&self) -> Option<&Value> {
        self.decoded.as_ref()
    }

    /// Deserialize the raw body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|e| NetError::codec(e.to_string()))
    }

    /// MIME type without parameters.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Final URI after redirects.
    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    pub fn has_errors(&self) -> bool {
        self.status >= 400
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn set_status(&mut self, status: u16, reason: impl Into<String>) {
        self.status = status;
        self.reason = reason.into();
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub fn set_headers(&mut self, headers: HeaderList) {
        self.headers = headers;
    }

    pub fn set_cookies(&mut self, cookies: Vec<Cookie>) {
        self.cookies = cookies;
    }

    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    pub fn set_decoded(&mut self, decoded: Option<Value>) {
        self.decoded = decoded;
    }

    pub fn set_content_type(&mut self, content_type: Option<String>, encoding: Option<String>) {
        self.content_type = content_type;
        self.encoding = encoding.unwrap_or_else(|| DEFAULT_ENCODING.to_string());
    }

    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = Some(uri);
    }

    /// Drop everything but `Set-Cookie` headers, used between redirect hops.
    pub fn keep_only_set_cookie(&mut self) {
        self.headers.retain(|h| h.is("Set-Cookie"));
    }

    /// True for a response that carries nothing at all.
    pub fn is_blank(&self) -> bool {
        self.headers.is_empty() && self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let resp = Response::new();
        assert_eq!(resp.status(), 0);
        assert_eq!(resp.encoding(), "utf-8");
        assert!(resp.is_blank());
        assert!(!resp.has_errors());
    }

    #[test]
    fn test_has_errors_boundary() {
        let mut resp = Response::new();
        resp.set_status(399, "");
        assert!(!resp.has_errors());
        resp.set_status(400, "Bad Request");
        assert!(resp.has_errors());
        resp.set_status(503, "Service Unavailable");
        assert!(resp.has_errors());
    }

    #[test]
    fn test_keep_only_set_cookie() {
        let mut resp = Response::new();
        resp.headers_mut().append("Location", "/next").unwrap();
        resp.headers_mut().append("Set-Cookie", "a=1").unwrap();
        resp.headers_mut().append("Cache-Control", "no-store").unwrap();
        resp.keep_only_set_cookie();
        assert_eq!(resp.headers().len(), 1);
        assert_eq!(resp.header("set-cookie"), Some("a=1"));
    }

    #[test]
    fn test_json_body() {
        let mut resp = Response::new();
        resp.set_body(Bytes::from_static(b"{\"foo\":\"bar\"}"));
        let v: serde_json::Value = resp.json().unwrap();
        assert_eq!(v["foo"], "bar");
    }
}
