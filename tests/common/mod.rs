//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use integration_guard::errors::RemoteError;
use integration_guard::resilience::parse_retry_after;
use reqwest::header::RETRY_AFTER;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Canned response from a mock backend.
#[allow(dead_code)]
pub struct MockResponse {
    pub status: u16,
    pub retry_after: Option<u64>,
    pub body: String,
}

#[allow(dead_code)]
impl MockResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.to_string(),
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// Start a programmable mock backend on an ephemeral port.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let response = f().await;
                let retry_after = response
                    .retry_after
                    .map(|secs| format!("Retry-After: {secs}\r\n"))
                    .unwrap_or_default();
                let raw = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                    response.status,
                    reason(response.status),
                    response.body.len(),
                    retry_after,
                    response.body
                );
                let _ = socket.write_all(raw.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// GET `url`, mapping transport failures and non-2xx responses to `RemoteError`.
#[allow(dead_code)]
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, RemoteError> {
    let res = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            RemoteError::Timeout(Duration::from_secs(5))
        } else {
            RemoteError::Network(e.to_string())
        }
    })?;

    let status = res.status();
    if status.is_success() {
        return res.text().await.map_err(|e| RemoteError::Network(e.to_string()));
    }

    let retry_after = res
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let body = res.text().await.unwrap_or_default();

    let err = RemoteError::http(status.as_u16(), body);
    Err(match retry_after {
        Some(delay) => err.with_retry_after(delay),
        None => err,
    })
}
