//! HTTP client with builder pattern.
//!
//! The client owns the configuration, the cookie jar, the codec registries,
//! the transport factory and the client-level middlewares. Every request
//! runs through a [`Transaction`].
//!
//! # Example
//!
//! ```rust,no_run
//! use wirehttp::Client;
//!
//! # async fn run() -> Result<(), wirehttp::NetError> {
//! let client = Client::builder().build()?;
//!
//! let resp = client
//!     .post("http://localhost:8080/200-ok-post")
//!     .json(&serde_json::json!({"foo": "bar"}))
//!     .send()
//!     .await?;
//! assert_eq!(resp.status(), 200);
//! # Ok(())
//! # }
//! ```

use crate::base::neterror::NetError;
use crate::codec::{mime, Registries};
use crate::config::Config;
use crate::cookies::cookie::Cookie;
use crate::cookies::storage::CookieStorage;
use crate::handler::{self, HandlerFactory};
use crate::http::method::{Method, Version};
use crate::http::request::Request;
use crate::http::requestbody::{RequestBody, UploadFile, UploadFileCollection};
use crate::http::response::Response;
use crate::http::transaction::Transaction;
use crate::middleware::{Middleware, MiddlewareEntry};
use crate::socket::proxy::Proxy;
use futures::future::BoxFuture;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// HTTP Client for making requests.
///
/// Cheap to clone; clones share the cookie jar and registries.
#[derive(Clone)]
pub struct Client {
    config: Arc<Config>,
    cookies: Arc<CookieStorage>,
    registries: Registries,
    handler: HandlerFactory,
    middlewares: Arc<Vec<MiddlewareEntry>>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self {
            config: Arc::new(Config::default()),
            cookies: Arc::new(CookieStorage::new()),
            registries: Registries::global().clone(),
            handler: handler::socket_handler(),
            middlewares: Arc::default(),
        }
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cookies(&self) -> &CookieStorage {
        &self.cookies
    }

    pub fn cookie_storage(&self) -> Arc<CookieStorage> {
        self.cookies.clone()
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn handler_factory(&self) -> &HandlerFactory {
        &self.handler
    }

    pub fn middlewares(&self) -> &[MiddlewareEntry] {
        &self.middlewares
    }

    /// Run a request through middlewares, transport and cookie handling.
    pub fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, NetError>> {
        Box::pin(Transaction::new(self, request).run())
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Get, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Post, url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Put, url)
    }

    /// Start building a PATCH request.
    pub fn patch<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Patch, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Delete, url)
    }

    /// Start building a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Head, url)
    }

    /// Start building an OPTIONS request.
    pub fn options<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::Options, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        let request = Request::parse(method, url.as_ref()).map(|r| r.with_version(self.config.version));
        RequestBuilder {
            client: self.clone(),
            request,
            value: None,
            uploads: UploadFileCollection::new(),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("cookies", &self.cookies.len())
            .field("middlewares", &self.middlewares)
            .finish()
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<Config>,
    cookies: Option<Arc<CookieStorage>>,
    registries: Option<Registries>,
    handler: Option<HandlerFactory>,
    middlewares: Vec<MiddlewareEntry>,
}

impl ClientBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set per-operation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = Some(self.config.unwrap_or_default().with_timeout(timeout));
        self
    }

    /// Share an existing cookie jar.
    pub fn cookie_storage(mut self, storage: Arc<CookieStorage>) -> Self {
        self.cookies = Some(storage);
        self
    }

    /// Use private registries instead of the process-wide ones.
    pub fn registries(mut self, registries: Registries) -> Self {
        self.registries = Some(registries);
        self
    }

    /// Transport used for every request.
    pub fn handler(mut self, factory: HandlerFactory) -> Self {
        self.handler = Some(factory);
        self
    }

    /// Use the hyper-backed transport.
    pub fn engine(self) -> Self {
        self.handler(handler::engine_handler())
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(MiddlewareEntry::new(middleware));
        self
    }

    pub fn middleware_at(mut self, middleware: Arc<dyn Middleware>, sort_key: u32) -> Self {
        self.middlewares
            .push(MiddlewareEntry::with_sort_key(middleware, sort_key));
        self
    }

    /// Build the client. Fails if the configuration does not validate.
    pub fn build(self) -> Result<Client, NetError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Client {
            config: Arc::new(config),
            cookies: self.cookies.unwrap_or_default(),
            registries: self
                .registries
                .unwrap_or_else(|| Registries::global().clone()),
            handler: self.handler.unwrap_or_else(handler::socket_handler),
            middlewares: Arc::new(self.middlewares),
        })
    }
}

/// Builder for a single request.
///
/// The first error (bad URL, bad header) is kept and returned from
/// [`build`](RequestBuilder::build) or [`send`](RequestBuilder::send).
pub struct RequestBuilder {
    client: Client,
    request: Result<Request, NetError>,
    value: Option<(String, Value)>,
    uploads: UploadFileCollection,
}

impl RequestBuilder {
    fn map<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Request) -> Result<Request, NetError>,
    {
        self.request = self.request.and_then(f);
        self
    }

    /// Set a header, replacing any with the same name.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.map(|r| r.with_header(name, value))
    }

    /// Add a header, keeping existing ones.
    pub fn add_header(self, name: &str, value: &str) -> Self {
        self.map(|r| r.with_added_header(name, value))
    }

    pub fn cookie(self, cookie: Cookie) -> Self {
        self.map(|r| Ok(r.with_cookie(cookie)))
    }

    /// Raw body; the codecs are not involved.
    pub fn body(self, body: impl Into<RequestBody>) -> Self {
        let body = body.into();
        self.map(|r| Ok(r.with_body(body)))
    }

    /// Body encoded by the request codec registered for `mime`.
    pub fn encoded(mut self, mime: &str, value: Value) -> Self {
        self.value = Some((mime::resolve(mime), value));
        self
    }

    /// Set JSON body.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(self, json: &T) -> Self {
        match serde_json::to_value(json) {
            Ok(value) => self.encoded(mime::JSON, value),
            Err(e) => self.map(|_| Err(NetError::codec(format!("json encode: {e}")))),
        }
    }

    /// URL-encoded form body.
    pub fn form(self, value: Value) -> Self {
        self.encoded(mime::FORM, value)
    }

    /// `multipart/form-data` body; uploads become file parts.
    pub fn multipart(self, value: Value) -> Self {
        self.encoded(mime::MULTIPART, value)
    }

    pub fn upload(mut self, file: UploadFile) -> Self {
        self.uploads.add(file);
        self
    }

    /// Attach a local file under `field`.
    pub fn file(self, field: &str, path: impl AsRef<Path>) -> Self {
        self.upload(UploadFile::local(field, path))
    }

    pub fn proxy(self, proxy: Proxy) -> Self {
        self.map(|r| Ok(r.with_proxy(proxy)))
    }

    pub fn middleware(self, middleware: Arc<dyn Middleware>) -> Self {
        self.map(|r| Ok(r.with_middleware(middleware)))
    }

    pub fn middleware_at(self, middleware: Arc<dyn Middleware>, sort_key: u32) -> Self {
        self.map(|r| Ok(r.with_middleware_at(middleware, sort_key)))
    }

    /// MIME type (or shortcut) expected back; sent as `Accept`.
    pub fn expects(self, mime: &str) -> Self {
        self.map(|r| Ok(r.with_expects(mime)))
    }

    pub fn version(self, version: Version) -> Self {
        self.map(|r| Ok(r.with_version(version)))
    }

    pub fn attribute(self, key: &str, value: &str) -> Self {
        self.map(|r| Ok(r.with_attribute(key, value)))
    }

    /// Encode the body and produce the request without sending it.
    pub fn build(self) -> Result<Request, NetError> {
        let request = self.request?;

        let (mime, value) = match self.value {
            Some(pair) => pair,
            None if !self.uploads.is_empty() => (mime::MULTIPART.to_string(), Value::Null),
            None => return Ok(request),
        };

        let codec = self
            .client
            .registries()
            .request
            .get(&mime)
            .ok_or_else(|| NetError::codec(format!("no request codec for {mime}")))?;
        let encoded = codec.encode(&value, &self.uploads)?;
        Ok(request.with_body(RequestBody::encoded(
            value,
            encoded.bytes,
            encoded.content_type,
            self.uploads,
        )))
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response, NetError> {
        let client = self.client.clone();
        let request = self.build()?;
        client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_json_body() {
        let req = Client::new()
            .post("http://example.com/api")
            .json(&json!({"foo": "bar"}))
            .header("X-Id", "1")
            .build()
            .unwrap();

        assert_eq!(req.method(), Method::Post);
        assert_eq!(&req.body().bytes()[..], br#"{"foo":"bar"}"#);
        assert_eq!(req.body().content_type(), Some("application/json"));
        assert_eq!(req.body().value(), Some(&json!({"foo": "bar"})));
        assert_eq!(req.header("x-id"), Some("1"));
    }

    #[test]
    fn test_first_error_kept() {
        let err = Client::new()
            .get("http://[bad")
            .header("X", "1")
            .build()
            .unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));

        let err = Client::new()
            .get("http://example.com/")
            .header("Bad:Name", "1")
            .build()
            .unwrap_err();
        assert!(matches!(err, NetError::InvalidHeader(_)));
    }

    #[test]
    fn test_form_body() {
        let req = Client::new()
            .put("http://example.com/")
            .form(json!({"a": "1"}))
            .build()
            .unwrap();
        assert_eq!(&req.body().bytes()[..], b"a=1");
    }

    #[test]
    fn test_unknown_codec() {
        let err = Client::new()
            .post("http://example.com/")
            .encoded("image/png", json!({}))
            .build()
            .unwrap_err();
        assert!(matches!(err, NetError::Codec(_)));
    }

    #[test]
    fn test_builder_validates_config() {
        let err = Client::builder()
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, NetError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_version_applies() {
        let client = Client::builder()
            .config(Config::default().with_version(Version::Http10))
            .build()
            .unwrap();
        let req = client.get("http://example.com/").build().unwrap();
        assert_eq!(req.version(), Version::Http10);
    }
}
