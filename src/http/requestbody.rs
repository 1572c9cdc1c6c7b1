//! Request body and upload files.

use crate::base::neterror::NetError;
use bytes::Bytes;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file that can be attached to a request body.
pub trait FileSource: Send + Sync + fmt::Debug {
    fn exists(&self) -> bool;
    fn can_read(&self) -> bool;
    fn read(&self) -> Result<Bytes, NetError>;
    /// File name without directories.
    fn name(&self) -> String;
    fn path(&self) -> String;
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FileSource for LocalFile {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn can_read(&self) -> bool {
        self.exists() && fs::File::open(&self.path).is_ok()
    }

    fn read(&self) -> Result<Bytes, NetError> {
        fs::read(&self.path)
            .map(Bytes::from)
            .map_err(|e| NetError::codec(format!("cannot read {}: {e}", self.path.display())))
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// An upload: form field name plus the file behind it.
#[derive(Debug, Clone)]
pub struct UploadFile {
    field: String,
    file: Arc<dyn FileSource>,
}

impl UploadFile {
    pub fn new(field: impl Into<String>, file: Arc<dyn FileSource>) -> Self {
        Self {
            field: field.into(),
            file,
        }
    }

    pub fn local(field: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::new(field, Arc::new(LocalFile::new(path)))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn file(&self) -> &dyn FileSource {
        self.file.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadFileCollection {
    files: Vec<UploadFile>,
}

impl UploadFileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: UploadFile) {
        self.files.push(file);
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<UploadFile> for UploadFileCollection {
    fn from_iter<I: IntoIterator<Item = UploadFile>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Request body: the value it was built from, the encoded bytes and the
/// content type those bytes carry.
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    value: Option<Value>,
    bytes: Bytes,
    content_type: Option<String>,
    uploads: UploadFileCollection,
}

impl RequestBody {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Raw bytes with an optional content type.
    pub fn raw(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
            ..Self::default()
        }
    }

    /// Output of a codec, keeping the source value around.
    pub fn encoded(
        value: Value,
        bytes: Bytes,
        content_type: String,
        uploads: UploadFileCollection,
    ) -> Self {
        Self {
            value: Some(value),
            bytes,
            content_type: Some(content_type),
            uploads,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn uploads(&self) -> &UploadFileCollection {
        &self.uploads
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::raw(s, None)
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::raw(Bytes::from(s.to_owned()), None)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::raw(v, None)
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::raw(b, None)
    }
}
