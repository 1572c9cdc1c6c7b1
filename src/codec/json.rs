use super::{mime, Codec, EncodedBody};
use crate::base::neterror::NetError;
use crate::http::requestbody::UploadFileCollection;
use bytes::Bytes;
use serde_json::Value;

/// `application/json`. Uploads are embedded as their file paths, not contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &str {
        mime::JSON
    }

    fn encode(&self, value: &Value, uploads: &UploadFileCollection) -> Result<EncodedBody, NetError> {
        let bytes = if uploads.is_empty() {
            serde_json::to_vec(value)
        } else {
            let mut value = match value {
                Value::Object(map) => Value::Object(map.clone()),
                Value::Null => Value::Object(Default::default()),
                _ => return Err(NetError::codec("uploads need an object body")),
            };
            if let Value::Object(map) = &mut value {
                for upload in uploads.iter() {
                    map.insert(upload.field().to_string(), Value::String(upload.file().path()));
                }
            }
            serde_json::to_vec(&value)
        }
        .map_err(|e| NetError::codec(format!("json encode: {e}")))?;

        Ok(EncodedBody {
            bytes: Bytes::from(bytes),
            content_type: mime::JSON.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, NetError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(bytes).map_err(|e| NetError::codec(format!("json decode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::requestbody::UploadFile;
    use serde_json::json;

    #[test]
    fn test_encode_decode() {
        let body = JsonCodec
            .encode(&json!({"foo": "bar"}), &UploadFileCollection::new())
            .unwrap();
        assert_eq!(&body.bytes[..], br#"{"foo":"bar"}"#);
        assert_eq!(body.content_type, "application/json");
        assert_eq!(JsonCodec.decode(&body.bytes).unwrap(), json!({"foo": "bar"}));
    }

    #[test]
    fn test_uploads_embed_paths() {
        let uploads: UploadFileCollection = vec![UploadFile::local("avatar", "/tmp/a.png")]
            .into_iter()
            .collect();
        let body = JsonCodec.encode(&json!({"id": 1}), &uploads).unwrap();
        let back = JsonCodec.decode(&body.bytes).unwrap();
        assert_eq!(back, json!({"id": 1, "avatar": "/tmp/a.png"}));

        assert!(JsonCodec.encode(&json!([1, 2]), &uploads).is_err());
    }

    #[test]
    fn test_decode_blank_and_malformed() {
        assert_eq!(JsonCodec.decode(b"  ").unwrap(), Value::Null);
        assert!(matches!(JsonCodec.decode(b"{nope"), Err(NetError::Codec(_))));
    }
}
