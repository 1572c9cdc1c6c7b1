//! `multipart/form-data` framing (RFC 7578).
//!
//! # Example
//! ```
//! use wirehttp::http::multipart::{Form, Part};
//!
//! let form = Form::new()
//!     .text("username", "user123")
//!     .part("file", Part::bytes(&b"file content"[..]).file_name("doc.txt"));
//!
//! assert!(form.content_type().starts_with("multipart/form-data; boundary="));
//! let body = form.into_body();
//! assert!(!body.is_empty());
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::borrow::Cow;

const BOUNDARY_TOKEN_LEN: usize = 24;

#[derive(Debug)]
pub struct Form {
    boundary: String,
    fields: Vec<(String, Part)>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Empty form with a fresh random boundary.
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(name, Part::text(value))
    }

    pub fn part(mut self, name: impl Into<String>, part: Part) -> Self {
        self.fields.push((name.into(), part));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact size of [`Form::into_body`] output.
    pub fn content_length(&self) -> usize {
        if self.fields.is_empty() {
            return 0;
        }
        let delimiter = 2 + self.boundary.len() + 2;
        let parts: usize = self
            .fields
            .iter()
            .map(|(name, part)| delimiter + part.headers(name).len() + 4 + part.data.len() + 2)
            .sum();
        parts + 2 + self.boundary.len() + 4
    }

    pub fn into_body(self) -> Bytes {
        if self.fields.is_empty() {
            return Bytes::new();
        }

        let mut out = BytesMut::with_capacity(self.content_length());
        for (name, part) in &self.fields {
            out.put_slice(b"--");
            out.put_slice(self.boundary.as_bytes());
            out.put_slice(b"\r\n");
            out.put_slice(part.headers(name).as_bytes());
            out.put_slice(b"\r\n\r\n");
            out.put_slice(&part.data);
            out.put_slice(b"\r\n");
        }
        out.put_slice(b"--");
        out.put_slice(self.boundary.as_bytes());
        out.put_slice(b"--\r\n");
        out.freeze()
    }
}

#[derive(Debug, Clone)]
pub struct Part {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl Part {
    /// A plain field value. No Content-Type is written for it.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(value.into()),
            content_type: None,
            file_name: None,
        }
    }

    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    fn headers(&self, name: &str) -> String {
        let mut header = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(name)
        );
        if let Some(filename) = &self.file_name {
            header.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
        }
        if let Some(mime) = &self.content_type {
            header.push_str(&format!("\r\nContent-Type: {mime}"));
        }
        header
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains(['"', '\\', '\r', '\n']) {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

fn generate_boundary() -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("----wirehttp{token}")
}
