use super::form::flatten;
use super::{mime, Codec, EncodedBody};
use crate::base::neterror::NetError;
use crate::http::multipart::{Form, Part};
use crate::http::requestbody::UploadFileCollection;
use serde_json::Value;

const OCTET_STREAM: &str = "application/octet-stream";

/// `multipart/form-data`, encode only. Fields become text parts and every
/// upload is read into a file part.
#[derive(Debug, Clone, Default)]
pub struct MultipartCodec {
    boundary: Option<String>,
}

impl MultipartCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed boundary instead of a random one.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: Some(boundary.into()),
        }
    }
}

impl Codec for MultipartCodec {
    fn content_type(&self) -> &str {
        mime::MULTIPART
    }

    fn encode(&self, value: &Value, uploads: &UploadFileCollection) -> Result<EncodedBody, NetError> {
        let mut form = match &self.boundary {
            Some(b) => Form::with_boundary(b.clone()),
            None => Form::new(),
        };

        let mut pairs = Vec::new();
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, v) in map {
                    flatten(key, v, &mut pairs);
                }
            }
            _ => return Err(NetError::codec("multipart body must be an object")),
        }
        for (name, text) in pairs {
            form = form.text(name, text);
        }

        for upload in uploads.iter() {
            let file = upload.file();
            if !file.exists() {
                return Err(NetError::codec(format!("upload {} does not exist", file.path())));
            }
            if !file.can_read() {
                return Err(NetError::codec(format!("upload {} is not readable", file.path())));
            }
            let part = Part::bytes(file.read()?)
                .file_name(file.name())
                .content_type(OCTET_STREAM);
            form = form.part(upload.field(), part);
        }

        let content_type = form.content_type();
        Ok(EncodedBody {
            bytes: form.into_body(),
            content_type,
        })
    }
}
