//! Content-Encoding and Content-Type handling.

use crate::base::neterror::NetError;
use bytes::Bytes;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use std::io::Read;

/// Undo a `Content-Encoding`. Unknown encodings pass through untouched.
pub fn decode_content(encoding: Option<&str>, body: Bytes) -> Result<Bytes, NetError> {
    if body.is_empty() {
        return Ok(body);
    }
    match encoding.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
        Some("gzip") | Some("x-gzip") => gunzip(&body).map(Bytes::from),
        Some("deflate") => inflate(&body).map(Bytes::from),
        None | Some("") | Some("identity") => Ok(body),
        Some(other) => {
            tracing::debug!(encoding = other, "Leaving unsupported content encoding as-is");
            Ok(body)
        }
    }
}

/// Inflate every gzip member in `data`, checking each CRC32/ISIZE trailer.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut out = Vec::new();
    MultiGzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| NetError::ContentDecodingFailed(format!("gzip: {e}")))?;
    Ok(out)
}

/// `deflate` is zlib-wrapped per RFC 9110, but some servers send a raw
/// stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut out = Vec::new();
    if ZlibDecoder::new(data).read_to_end(&mut out).is_ok() {
        return Ok(out);
    }
    out.clear();
    DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| NetError::ContentDecodingFailed(format!("deflate: {e}")))?;
    Ok(out)
}

/// Split `type/subtype; charset=X` into the MIME type and the charset.
pub fn split_content_type(value: &str) -> (String, Option<String>) {
    let mut parts = value.split(';');
    let mime = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let charset = parts.find_map(|p| {
        let (k, v) = p.split_once('=')?;
        k.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| v.trim().trim_matches('"').to_ascii_lowercase())
    });
    (mime, charset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::{Compression, GzBuilder};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_gunzip_hello() {
        assert_eq!(gunzip(&gzip(b"hello")).unwrap(), b"hello");
    }

    #[test]
    fn test_gunzip_with_file_name() {
        let mut enc = GzBuilder::new()
            .filename("hello.txt")
            .comment("greeting")
            .write(Vec::new(), Compression::fast());
        enc.write_all(b"hello").unwrap();
        let data = enc.finish().unwrap();
        assert_eq!(gunzip(&data).unwrap(), b"hello");
    }

    #[test]
    fn test_gunzip_rejects_garbage() {
        assert!(matches!(
            gunzip(b"definitely not gzip data"),
            Err(NetError::ContentDecodingFailed(_))
        ));
    }

    #[test]
    fn test_gunzip_concatenated_members() {
        let mut data = gzip(b"hel");
        data.extend_from_slice(&gzip(b"lo"));
        assert_eq!(gunzip(&data).unwrap(), b"hello");
    }

    #[test]
    fn test_gunzip_rejects_bad_checksum() {
        let mut data = gzip(b"hello");
        let crc = data.len() - 8;
        data[crc] ^= 0xff;
        assert!(matches!(gunzip(&data), Err(NetError::ContentDecodingFailed(_))));
    }

    #[test]
    fn test_deflate_zlib_and_raw() {
        let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
        z.write_all(b"zlib body").unwrap();
        assert_eq!(inflate(&z.finish().unwrap()).unwrap(), b"zlib body");

        let mut raw = flate2::write::DeflateEncoder::new(Vec::new(), Compression::default());
        raw.write_all(b"raw body").unwrap();
        assert_eq!(inflate(&raw.finish().unwrap()).unwrap(), b"raw body");
    }

    #[test]
    fn test_decode_content_passthrough() {
        let body = Bytes::from_static(b"plain");
        assert_eq!(decode_content(None, body.clone()).unwrap(), body);
        assert_eq!(decode_content(Some("br"), body.clone()).unwrap(), body);
        assert_eq!(
            decode_content(Some("GZIP"), Bytes::from(gzip(b"plain"))).unwrap(),
            body
        );
    }

    #[test]
    fn test_split_content_type() {
        assert_eq!(
            split_content_type("text/html; charset=ISO-8859-1"),
            ("text/html".to_string(), Some("iso-8859-1".to_string()))
        );
        assert_eq!(
            split_content_type("application/json"),
            ("application/json".to_string(), None)
        );
        assert_eq!(
            split_content_type("multipart/form-data; boundary=x; charset=\"utf-8\""),
            ("multipart/form-data".to_string(), Some("utf-8".to_string()))
        );
    }
}
