use super::Codec;
use crate::base::neterror::NetError;
use serde_json::Value;

/// Parses textual bodies (`text/plain`, `text/html`, XML) into a string value.
#[derive(Debug, Clone)]
pub struct TextCodec {
    content_type: String,
}

impl TextCodec {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }
}

impl Codec for TextCodec {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, NetError> {
        Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::requestbody::UploadFileCollection;

    #[test]
    fn test_decode_only() {
        let codec = TextCodec::new("text/html");
        assert_eq!(codec.decode(b"<p>hi</p>").unwrap(), Value::from("<p>hi</p>"));
        assert!(codec.encode(&Value::Null, &UploadFileCollection::new()).is_err());
    }
}
