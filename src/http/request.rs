//! Immutable request value.
//!
//! Every `with_*` method returns a new request and leaves the receiver
//! untouched. Nested collections sit behind `Arc` and are copied only
//! when one side changes them.

use crate::base::neterror::NetError;
use crate::cookies::cookie::Cookie;
use crate::http::headers::HeaderList;
use crate::http::method::{Method, Version};
use crate::http::requestbody::RequestBody;
use crate::http::uri::Uri;
use crate::middleware::{Middleware, MiddlewareEntry};
use crate::socket::proxy::Proxy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: Arc<HeaderList>,
    cookies: Arc<Vec<Cookie>>,
    body: Arc<RequestBody>,
    proxy: Option<Arc<Proxy>>,
    middlewares: Arc<Vec<MiddlewareEntry>>,
    attributes: Arc<BTreeMap<String, String>>,
    expects: Option<String>,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::default(),
            headers: Arc::default(),
            cookies: Arc::default(),
            body: Arc::default(),
            proxy: None,
            middlewares: Arc::default(),
            attributes: Arc::default(),
            expects: None,
        }
    }

    /// Parse `uri` and build a request for it.
    pub fn parse(method: Method, uri: &str) -> Result<Self, NetError> {
        Ok(Self::new(method, Uri::parse(uri)?))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Headers for in-place edits; copies them first if shared.
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        Arc::make_mut(&mut self.headers)
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_deref()
    }

    pub fn middlewares(&self) -> &[MiddlewareEntry] {
        &self.middlewares
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// MIME type the caller expects back; sent as `Accept`.
    pub fn expects(&self) -> Option<&str> {
        self.expects.as_deref()
    }

    pub fn with_method(&self, method: Method) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    pub fn with_uri(&self, uri: Uri) -> Self {
        Self {
            uri,
            ..self.clone()
        }
    }

    pub fn with_version(&self, version: Version) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Replace any header with this name.
    pub fn with_header(&self, name: &str, value: &str) -> Result<Self, NetError> {
        let mut next = self.clone();
        next.headers_mut().set(name, value)?;
        Ok(next)
    }

    /// Add a header, keeping existing ones with the same name.
    pub fn with_added_header(&self, name: &str, value: &str) -> Result<Self, NetError> {
        let mut next = self.clone();
        next.headers_mut().append(name, value)?;
        Ok(next)
    }

    pub fn without_header(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.headers_mut().remove(name);
        next
    }

    pub fn with_headers(&self, headers: HeaderList) -> Self {
        Self {
            headers: Arc::new(headers),
            ..self.clone()
        }
    }

    /// Add a request-local cookie. A cookie with the same name is replaced.
    pub fn with_cookie(&self, cookie: Cookie) -> Self {
        let mut next = self.clone();
        let cookies = Arc::make_mut(&mut next.cookies);
        cookies.retain(|c| c.name != cookie.name);
        cookies.push(cookie);
        next
    }

    pub fn with_cookies(&self, cookies: Vec<Cookie>) -> Self {
        Self {
            cookies: Arc::new(cookies),
            ..self.clone()
        }
    }

    pub fn with_body(&self, body: RequestBody) -> Self {
        Self {
            body: Arc::new(body),
            ..self.clone()
        }
    }

    pub fn with_proxy(&self, proxy: Proxy) -> Self {
        Self {
            proxy: Some(Arc::new(proxy)),
            ..self.clone()
        }
    }

    pub fn without_proxy(&self) -> Self {
        Self {
            proxy: None,
            ..self.clone()
        }
    }

    /// Attach a middleware under its own sort key.
    pub fn with_middleware(&self, middleware: Arc<dyn Middleware>) -> Self {
        self.with_entry(MiddlewareEntry::new(middleware))
    }

    /// Attach a middleware under an explicit sort key.
    pub fn with_middleware_at(&self, middleware: Arc<dyn Middleware>, sort_key: u32) -> Self {
        self.with_entry(MiddlewareEntry::with_sort_key(middleware, sort_key))
    }

    fn with_entry(&self, entry: MiddlewareEntry) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.middlewares).push(entry);
        next
    }

    pub fn with_attribute(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.attributes).insert(key.into(), value.into());
        next
    }

    pub fn with_expects(&self, mime: impl Into<String>) -> Self {
        Self {
            expects: Some(mime.into()),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri.to_string())
            .field("version", &self.version)
            .field("headers", &self.headers.len())
            .field("cookies", &self.cookies.len())
            .field("body", &self.body.len())
            .field("proxy", &self.proxy)
            .field("middlewares", &self.middlewares)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::parse(Method::Get, "http://example.com/path").unwrap()
    }

    #[test]
    fn test_with_header_leaves_original() {
        let a = request().with_header("X-A", "1").unwrap();
        let b = a.with_header("X-B", "2").unwrap();

        assert!(a.header("X-B").is_none());
        assert_eq!(b.header("x-a"), Some("1"));
        assert_eq!(b.header("x-b"), Some("2"));
    }

    #[test]
    fn test_headers_mut_copies_shared() {
        let a = request().with_header("X-A", "1").unwrap();
        let mut b = a.clone();
        b.headers_mut().set("X-A", "changed").unwrap();
        assert_eq!(a.header("X-A"), Some("1"));
        assert_eq!(b.header("X-A"), Some("changed"));
    }

    #[test]
    fn test_cookie_replace_by_name() {
        let r = request()
            .with_cookie(Cookie::new("a", "1"))
            .with_cookie(Cookie::new("a", "2"))
            .with_cookie(Cookie::new("b", "3"));
        assert_eq!(r.cookies().len(), 2);
        assert_eq!(r.cookies()[0].value, "2");
        assert_eq!(r.cookies()[1].value, "3");
    }

    #[test]
    fn test_attributes() {
        let a = request();
        let b = a.with_attribute("retry-attempt", "1");
        assert!(a.attribute("retry-attempt").is_none());
        assert_eq!(b.attribute("retry-attempt"), Some("1"));
    }

    #[test]
    fn test_body_and_proxy() {
        let r = request()
            .with_method(Method::Post)
            .with_body("payload".into())
            .with_proxy(Proxy::http("proxy", 3128).unwrap());
        assert_eq!(r.method(), Method::Post);
        assert_eq!(r.body().len(), 7);
        assert_eq!(r.proxy().unwrap().port(), 3128);
        assert!(r.without_proxy().proxy().is_none());
    }
}
