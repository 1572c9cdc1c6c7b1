use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wirehttp::config::Config;
use wirehttp::handler::{Handler, SocketHandler};
use wirehttp::http::{Method, Request};
use wirehttp::{ErrorKind, NetError};

/// Serve one connection with a canned response, then close.
async fn serve_once(response: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}")
}

async fn get(url: &str, config: Config) -> Result<wirehttp::Response, NetError> {
    let request = Request::parse(Method::Get, url).unwrap();
    SocketHandler::new(config).send(request).await
}

#[tokio::test]
async fn test_chunked_until_eof() {
    let url = serve_once(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n".to_vec(),
    )
    .await;
    let resp = get(&format!("{url}/"), Config::default()).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(&resp.body()[..], b"Wikipedia");
}

#[tokio::test]
async fn test_chunked_with_terminator() {
    let url = serve_once(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;ext=1\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec(),
    )
    .await;
    let resp = get(&url, Config::default()).await.unwrap();
    assert_eq!(resp.text(), "Wikipedia");
}

#[tokio::test]
async fn test_gzip_body() {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(b"hello").unwrap();
    let gz = enc.finish().unwrap();

    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Type: text/plain; charset=UTF-8\r\nContent-Length: {}\r\n\r\n",
        gz.len()
    )
    .into_bytes();
    response.extend_from_slice(&gz);

    let url = serve_once(response).await;
    let resp = get(&url, Config::default().with_compress(Some("gzip"))).await.unwrap();
    assert_eq!(&resp.body()[..], b"hello");
    assert_eq!(resp.content_type(), Some("text/plain"));
    assert_eq!(resp.encoding(), "utf-8");
}

#[tokio::test]
async fn test_read_to_eof_without_length() {
    let url = serve_once(b"HTTP/1.0 200 OK\r\nX-A: 1\r\n\r\nuntil close".to_vec()).await;
    let resp = get(&url, Config::default()).await.unwrap();
    assert_eq!(resp.version(), "1.0");
    assert_eq!(resp.text(), "until close");
}

#[tokio::test]
async fn test_interim_response_skipped() {
    let url = serve_once(
        b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 201 Created\r\nContent-Length: 2\r\n\r\nok".to_vec(),
    )
    .await;
    let resp = get(&url, Config::default()).await.unwrap();
    assert_eq!(resp.status(), 201);
    assert_eq!(resp.text(), "ok");
}

#[tokio::test]
async fn test_empty_response_is_error() {
    let url = serve_once(Vec::new()).await;
    let err = get(&url, Config::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().contains("empty server response"));
}

#[tokio::test]
async fn test_read_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let config = Config::default().with_timeout(Duration::from_millis(200));
    let err = get(&format!("http://{addr}/"), config).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_carries_code() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = get(&format!("http://127.0.0.1:{port}/"), Config::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.os_code().is_some());
}

#[tokio::test]
async fn test_http2_rejected_before_io() {
    let request = Request::parse(Method::Get, "http://127.0.0.1:1/")
        .unwrap()
        .with_version(wirehttp::Version::Http20);
    let err = SocketHandler::new(Config::default()).send(request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
