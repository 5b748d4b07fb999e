//! Integration tests for the HTTP quote source

use quote_stream::feed::{FeedError, HttpQuoteSource, HttpSourceConfig, QuoteSource};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one canned HTTP response and report the request line
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let request_line = String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let _ = tx.send(request_line);

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (base_url, rx)
}

fn source(base_url: String) -> HttpQuoteSource {
    HttpQuoteSource::with_config(HttpSourceConfig {
        base_url,
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_batch() {
    let body = r#"[
        {"stock": "ABC", "top_ask": {"price": 121.2, "size": 36}, "top_bid": {"price": 120.48, "size": 109}, "timestamp": "2019-02-11 22:06:30.572453"},
        {"stock": "DEF", "top_ask": {"price": 117.87, "size": 81}, "top_bid": null, "timestamp": "2019-02-11 22:06:30.572453"}
    ]"#;
    let (base_url, request) = serve_once("200 OK", body).await;

    let batch = source(base_url).fetch().await.unwrap().unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].symbol, "ABC");
    assert_eq!(batch[0].top_bid.unwrap().price, 120.48);
    assert!(batch[1].top_bid.is_none());

    assert_eq!(request.await.unwrap(), "GET /query?id=1 HTTP/1.1");
}

#[tokio::test]
async fn test_fetch_empty_array_is_no_data() {
    let (base_url, _request) = serve_once("200 OK", "[]").await;
    assert!(source(base_url).fetch().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_server_error() {
    let (base_url, _request) = serve_once("500 Internal Server Error", "boom").await;

    match source(base_url).fetch().await {
        Err(FeedError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let (base_url, _request) = serve_once("200 OK", "{\"not\": \"a batch\"}").await;
    assert!(matches!(
        source(base_url).fetch().await,
        Err(FeedError::Decode(_))
    ));
}
