//! HTTP/1.x framing: status line, header section and body readers.

use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::socket::stream::Connection;
use bytes::{Bytes, BytesMut};

/// Parsed `HTTP/<version> <code> <reason>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub status: u16,
    pub reason: String,
}

/// Parse a status line. Returns `None` for anything else.
pub fn parse_status_line(line: &str) -> Option<StatusLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let rest = line.strip_prefix("HTTP/")?;
    let (version, rest) = rest.split_once(' ')?;
    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let (code, reason) = match rest.split_once(' ') {
        Some((code, reason)) => (code, reason),
        None => (rest, ""),
    };
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(StatusLine {
        version: version.to_string(),
        status: code.parse().ok()?,
        reason: reason.trim().to_string(),
    })
}

/// Split a header line on the first `:`. Both halves are trimmed.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Feed one raw line of a response head into `response`.
///
/// Returns `false` once the blank line ending the head is seen.
pub fn apply_head_line(response: &mut Response, line: &str) -> bool {
    if line == "\r\n" || line == "\n" {
        return false;
    }
    if let Some(status) = parse_status_line(line) {
        response.set_version(status.version);
        response.set_status(status.status, status.reason);
    } else if let Some((name, value)) = parse_header_line(line) {
        if let Err(e) = response.headers_mut().append(name, value) {
            tracing::debug!(error = %e, "Skipping malformed response header");
        }
    } else {
        tracing::trace!(line = %line.trim_end(), "Ignoring unparseable head line");
    }
    true
}

/// Read a response head (status line and headers) into `response`.
///
/// Stops at the first blank line or at end of stream.
pub async fn read_head(conn: &mut Connection, response: &mut Response) -> Result<(), NetError> {
    while let Some(raw) = conn.read_line().await? {
        let line = String::from_utf8_lossy(&raw);
        if !apply_head_line(response, &line) {
            break;
        }
    }
    Ok(())
}

/// Decode a `Transfer-Encoding: chunked` body.
///
/// Blank lines between chunks are skipped. Reading stops at the zero-size
/// chunk (after draining trailers) or at end of stream, whichever comes first.
pub async fn read_chunked(conn: &mut Connection) -> Result<Bytes, NetError> {
    let mut body = BytesMut::new();
    while let Some(raw) = conn.read_line().await? {
        let line = String::from_utf8_lossy(&raw);
        let size_field = line.split(';').next().unwrap_or("").trim();
        if size_field.is_empty() {
            continue;
        }
        let size = match usize::from_str_radix(size_field, 16) {
            Ok(size) => size,
            Err(_) => {
                conn.close().await;
                return Err(NetError::connection(format!("invalid chunk size {size_field:?}")));
            }
        };
        if size == 0 {
            drain_trailers(conn).await?;
            break;
        }
        body.extend_from_slice(&conn.read_exact(size).await?);
    }
    Ok(body.freeze())
}

async fn drain_trailers(conn: &mut Connection) -> Result<(), NetError> {
    while let Some(raw) = conn.read_line().await? {
        if raw == b"\r\n" || raw == b"\n" {
            break;
        }
    }
    Ok(())
}

/// Read a body of known length.
pub async fn read_content_length(conn: &mut Connection, len: usize) -> Result<Bytes, NetError> {
    conn.read_exact(len).await
}

/// Read until the peer closes the connection.
pub async fn read_to_eof(conn: &mut Connection) -> Result<Bytes, NetError> {
    conn.read_to_end().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let s = parse_status_line("HTTP/1.1 404 Not Found\r\n").unwrap();
        assert_eq!(s.version, "1.1");
        assert_eq!(s.status, 404);
        assert_eq!(s.reason, "Not Found");

        let s = parse_status_line("HTTP/1.0 200\r\n").unwrap();
        assert_eq!(s.status, 200);
        assert_eq!(s.reason, "");

        assert!(parse_status_line("Content-Type: text/html\r\n").is_none());
        assert!(parse_status_line("HTTP/1.1 20x OK").is_none());
    }

    #[test]
    fn test_header_line() {
        assert_eq!(
            parse_header_line("Content-Type:  text/html; charset=utf-8 \r\n"),
            Some(("Content-Type", "text/html; charset=utf-8"))
        );
        assert_eq!(parse_header_line("X-Time: 12:30:00"), Some(("X-Time", "12:30:00")));
        assert_eq!(parse_header_line(": no name"), None);
        assert_eq!(parse_header_line("no colon"), None);
    }

    #[test]
    fn test_apply_head_lines() {
        let mut resp = Response::new();
        assert!(apply_head_line(&mut resp, "HTTP/1.1 302 Found\r\n"));
        assert!(apply_head_line(&mut resp, "Location: /new\r\n"));
        assert!(!apply_head_line(&mut resp, "\r\n"));
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.version(), "1.1");
        assert_eq!(resp.header("location"), Some("/new"));
    }
}
