use super::{mime, Codec, EncodedBody};
use crate::base::neterror::NetError;
use crate::http::requestbody::UploadFileCollection;
use bytes::Bytes;
use serde_json::Value;
use url::form_urlencoded;

/// `application/x-www-form-urlencoded`, encode only.
///
/// Arrays repeat the key, nested objects use `key[sub]` names.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl Codec for FormCodec {
    fn content_type(&self) -> &str {
        mime::FORM
    }

    fn encode(&self, value: &Value, uploads: &UploadFileCollection) -> Result<EncodedBody, NetError> {
        if !uploads.is_empty() {
            return Err(NetError::codec("form bodies cannot carry uploads; use multipart"));
        }

        let mut pairs = Vec::new();
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, v) in map {
                    flatten(key, v, &mut pairs);
                }
            }
            _ => return Err(NetError::codec("form body must be an object")),
        }

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Ok(EncodedBody {
            bytes: Bytes::from(encoded),
            content_type: mime::FORM.to_string(),
        })
    }
}

/// Flatten a JSON value into `(name, scalar)` pairs.
pub(crate) fn flatten(key: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(key, item, out);
            }
        }
        Value::Object(map) => {
            for (sub, v) in map {
                flatten(&format!("{key}[{sub}]"), v, out);
            }
        }
        scalar => out.push((key.to_string(), scalar_string(scalar))),
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
