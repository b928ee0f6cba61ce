//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use resilience_demo::client::ResilientClient;
use resilience_demo::config::AppConfig;
use resilience_demo::remote::{DecisionSource, FlakyEndpoint, RemoteCall};
use resilience_demo::resilience::{BreakerRegistry, CallError, CircuitBreakerConfig, RetryPolicy};
use resilience_demo::{HttpServer, Shutdown};

/// In-memory dependency: fails when asked to, otherwise waits `delay` and answers "OK".
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    calls: AtomicU32,
    delay: Duration,
}

impl InMemoryRemote {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicU32::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCall for InMemoryRemote {
    async fn sleep(&self, simulate_error: bool) -> Result<String, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if simulate_error {
            return Err(CallError::Transient("simulated failure".into()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok("OK".to_string())
    }
}

/// Client over an in-memory remote with the given decisions.
pub fn client_with(
    remote: Arc<InMemoryRemote>,
    decisions: Arc<dyn DecisionSource>,
    policy: RetryPolicy,
    breaker: CircuitBreakerConfig,
) -> ResilientClient {
    let endpoint = FlakyEndpoint::new(remote, decisions);
    ResilientClient::new("test", endpoint, policy, Arc::new(BreakerRegistry::new(breaker)))
}

/// Start a programmable backend on an ephemeral port.
///
/// `f` receives the request path and returns `(status, body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let request = String::from_utf8_lossy(&buf[..n]);
                        let path = request
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Bind an ephemeral listener and let `configure` adjust the config; the
/// remote base URL defaults to the server itself.
pub async fn start_server<C>(configure: C) -> (SocketAddr, Shutdown)
where
    C: FnOnce(&mut AppConfig),
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();
    config.remote.base_url = format!("http://{}", addr);
    configure(&mut config);

    let server = resilience_demo::lifecycle::startup::build_server(config).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Server wired directly to a prepared client.
pub async fn start_server_with_client(client: ResilientClient) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();
    let server = HttpServer::new(config, Arc::new(client));
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
