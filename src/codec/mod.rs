//! Body codecs and the MIME-keyed registries that hold them.
//!
//! Two registries exist side by side: the request registry encodes outgoing
//! bodies (and can decode them back), the response registry only parses.
//!
//! # Example
//! ```
//! use wirehttp::codec::Registries;
//! use wirehttp::http::requestbody::UploadFileCollection;
//!
//! let registries = Registries::default();
//! let json = registries.request.get("json").unwrap();
//! let body = json
//!     .encode(&serde_json::json!({"k": "v"}), &UploadFileCollection::new())
//!     .unwrap();
//! assert_eq!(&body.bytes[..], br#"{"k":"v"}"#);
//! ```

pub mod form;
pub mod json;
pub mod mime;
pub mod multipart;
pub mod text;

use crate::base::neterror::NetError;
use crate::http::requestbody::UploadFileCollection;
use bytes::Bytes;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

pub use form::FormCodec;
pub use json::JsonCodec;
pub use multipart::MultipartCodec;
pub use text::TextCodec;

/// Bytes produced by a codec and the content type they must be sent with.
#[derive(Debug, Clone)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: String,
}

pub trait Codec: Send + Sync {
    /// Content type this codec produces.
    fn content_type(&self) -> &str;

    fn encode(&self, _value: &Value, _uploads: &UploadFileCollection) -> Result<EncodedBody, NetError> {
        Err(NetError::codec(format!("{}: encoding not supported", self.content_type())))
    }

    fn decode(&self, _bytes: &[u8]) -> Result<Value, NetError> {
        Err(NetError::codec(format!("{}: decoding not supported", self.content_type())))
    }
}

pub type CodecFactory = Arc<dyn Fn() -> Arc<dyn Codec> + Send + Sync>;

/// MIME type → codec factory map, safe to share between tasks.
///
/// Keys go through [`mime::resolve`], so `json` and `application/json`
/// name the same entry.
#[derive(Default)]
pub struct CodecRegistry {
    factories: DashMap<String, CodecFactory>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the same type.
    pub fn add<F>(&self, mime: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Codec> + Send + Sync + 'static,
    {
        self.factories.insert(mime::resolve(mime), Arc::new(factory));
    }

    pub fn has(&self, mime: &str) -> bool {
        self.factories.contains_key(&mime::resolve(mime))
    }

    /// Returns whether an entry was removed.
    pub fn delete(&self, mime: &str) -> bool {
        self.factories.remove(&mime::resolve(mime)).is_some()
    }

    pub fn get(&self, mime: &str) -> Option<Arc<dyn Codec>> {
        // Clone the factory out so the shard lock is released before it runs.
        let factory = self.factories.get(&mime::resolve(mime))?.value().clone();
        Some(factory())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        f.debug_struct("CodecRegistry").field("types", &keys).finish()
    }
}

/// Request-side and response-side registries.
#[derive(Debug, Clone)]
pub struct Registries {
    pub request: Arc<CodecRegistry>,
    pub response: Arc<CodecRegistry>,
}

impl Default for Registries {
    /// Fresh registries holding the built-in codecs.
    fn default() -> Self {
        let request = CodecRegistry::new();
        request.add(mime::JSON, || Arc::new(JsonCodec));
        request.add(mime::FORM, || Arc::new(FormCodec));
        request.add(mime::MULTIPART, || Arc::new(MultipartCodec::new()));

        let response = CodecRegistry::new();
        response.add(mime::JSON, || Arc::new(JsonCodec));
        for t in [mime::TEXT, mime::HTML, mime::XML, "text/xml"] {
            response.add(t, move || Arc::new(TextCodec::new(t)));
        }

        Self {
            request: Arc::new(request),
            response: Arc::new(response),
        }
    }
}

impl Registries {
    /// Process-wide registries shared by every client built without its own.
    pub fn global() -> &'static Registries {
        static GLOBAL: OnceLock<Registries> = OnceLock::new();
        GLOBAL.get_or_init(Registries::default)
    }
}
