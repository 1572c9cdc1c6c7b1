//! Connected sockets and the owned connection handle.
//!
//! [`SocketType`] is the raw byte stream (plain TCP or TLS over TCP).
//! [`Connection`] owns one and applies the configured timeout to every
//! operation. Any failed or timed out operation closes the connection
//! before the error is returned, and dropping the handle closes it too.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use bytes::{Bytes, BytesMut};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::error::Elapsed;
use tokio_boring::SslStream;

/// Longest line accepted in a status line or header section.
pub const MAX_LINE_LEN: u64 = 64 * 1024;

/// Size of a single bounded body read.
const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug)]
pub enum SocketType {
    Tcp(TcpStream),
    Ssl(SslStream<TcpStream>),
}

impl SocketType {
    pub fn is_tls(&self) -> bool {
        matches!(self, SocketType::Ssl(_))
    }
}

impl AsyncRead for SocketType {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            SocketType::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            SocketType::Ssl(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SocketType {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            SocketType::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            SocketType::Ssl(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            SocketType::Tcp(s) => Pin::new(s).poll_flush(cx),
            SocketType::Ssl(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            SocketType::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            SocketType::Ssl(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Owned connection with a per-operation timeout.
#[derive(Debug)]
pub struct Connection {
    stream: Option<BufReader<SocketType>>,
    timeout: Duration,
}

impl Connection {
    pub fn new(socket: SocketType, timeout: Duration) -> Self {
        Self {
            stream: Some(BufReader::new(socket)),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    pub fn is_tls(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.get_ref().is_tls())
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<SocketType>, NetError> {
        self.stream
            .as_mut()
            .ok_or_else(|| NetError::connection("connection already closed"))
    }

    /// Turn the outcome of a timed operation into a `NetError`, closing
    /// the connection on failure.
    async fn settle<T>(
        &mut self,
        outcome: Result<std::io::Result<T>, Elapsed>,
        what: &str,
    ) -> Result<T, NetError> {
        let result = match outcome {
            Ok(r) => r.read_context(what),
            Err(_) => Err(NetError::ConnectionTimedOut(self.timeout)),
        };
        if let Err(e) = &result {
            tracing::debug!(error = %e, what, "Closing connection after failure");
            self.close().await;
        }
        result
    }

    pub async fn write_all(&mut self, data: &[u8]) -> Result<(), NetError> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?.get_mut();
        let outcome = tokio::time::timeout(timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await;
        self.settle(outcome, "writing request").await
    }

    /// Read one line including its terminator. `None` at end of stream.
    pub async fn read_line(&mut self) -> Result<Option<Vec<u8>>, NetError> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        let mut line = Vec::new();
        let outcome =
            tokio::time::timeout(timeout, (&mut *stream).take(MAX_LINE_LEN).read_until(b'\n', &mut line))
                .await;
        let n = self.settle(outcome, "reading line").await?;
        if n == 0 {
            return Ok(None);
        }
        if n as u64 >= MAX_LINE_LEN && !line.ends_with(b"\n") {
            self.close().await;
            return Err(NetError::connection("line exceeds maximum length"));
        }
        Ok(Some(line))
    }

    /// Read exactly `len` bytes in bounded chunks.
    pub async fn read_exact(&mut self, len: usize) -> Result<Bytes, NetError> {
        let mut out = BytesMut::with_capacity(len.min(1 << 20));
        let mut buf = vec![0u8; READ_CHUNK];
        while out.len() < len {
            let want = (len - out.len()).min(READ_CHUNK);
            let n = self.read_some(&mut buf[..want]).await?;
            if n == 0 {
                self.close().await;
                return Err(NetError::connection(format!(
                    "connection closed after {} of {} bytes",
                    out.len(),
                    len
                )));
            }
            out.extend_from_slice(&buf[..n]);
        }
        Ok(out.freeze())
    }

    /// Read whatever is available, up to `buf.len()`. `0` means end of stream.
    pub async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        let outcome = tokio::time::timeout(timeout, stream.read(buf)).await;
        self.settle(outcome, "reading body").await
    }

    pub async fn read_to_end(&mut self) -> Result<Bytes, NetError> {
        let mut out = BytesMut::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = self.read_some(&mut buf).await?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        Ok(out.freeze())
    }

    /// Shut the stream down. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = tokio::time::timeout(self.timeout, stream.get_mut().shutdown()).await;
            tracing::trace!("Connection closed");
        }
    }

    /// Release the socket, e.g. to wrap it in TLS or hand it to another
    /// engine. Bytes already buffered but not consumed are discarded.
    pub fn into_socket(mut self) -> Result<SocketType, NetError> {
        match self.stream.take() {
            Some(reader) => {
                if !reader.buffer().is_empty() {
                    tracing::warn!(bytes = reader.buffer().len(), "Discarding buffered bytes");
                }
                Ok(reader.into_inner())
            }
            None => Err(NetError::connection("connection already closed")),
        }
    }
}
