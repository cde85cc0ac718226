#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use go_installer::download::Transport;
use reqwest::{Client, Request, Response};
use url::Url;
use wiremock::MockServer;

/// Set to `1` to turn sandboxes without loopback sockets into test failures.
const REQUIRE_SOCKETS_ENV: &str = "GO_INSTALLER_REQUIRE_SOCKET_TESTS";

/// Host used in test URLs; it passes validation and is rewritten to the mock
/// server before sending.
pub const PUBLIC_HOST: &str = "https://downloads.example.com";

/// Sends every request to `target` (a mock server), keeping path and query,
/// and counts sends.
#[derive(Debug)]
pub struct RewritingTransport {
    client: Client,
    target: Url,
    sends: AtomicUsize,
}

impl RewritingTransport {
    pub fn new(target: &str) -> Arc<Self> {
        Arc::new(Self {
            client: Client::new(),
            target: Url::parse(target).unwrap(),
            sends: AtomicUsize::new(0),
        })
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RewritingTransport {
    async fn send(&self, mut request: Request) -> Result<Response, reqwest::Error> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let url = request.url_mut();
        url.set_scheme(self.target.scheme()).unwrap();
        url.set_host(self.target.host_str()).unwrap();
        url.set_port(self.target.port()).unwrap();
        self.client.execute(request).await
    }
}

/// Forwards to a real client unchanged and counts sends.
#[derive(Debug, Default)]
pub struct CountingTransport {
    client: Client,
    sends: AtomicUsize,
}

impl CountingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_client(client: Client) -> Arc<Self> {
        Arc::new(Self {
            client,
            sends: AtomicUsize::new(0),
        })
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: Request) -> Result<Response, reqwest::Error> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.client.execute(request).await
    }
}

/// Returns a localhost URL on which nothing is listening.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/go.tar.gz")
}

/// True when this environment cannot bind a loopback socket and the calling
/// test should return early.
///
/// # Panics
///
/// Panics instead of skipping when `GO_INSTALLER_REQUIRE_SOCKET_TESTS` is on.
#[track_caller]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let caller = std::panic::Location::caller();
    let required = std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes"));
    assert!(
        !required,
        "no loopback socket available for {}:{} and {REQUIRE_SOCKETS_ENV} is set",
        caller.file(),
        caller.line()
    );
    eprintln!(
        "skipping {}:{}: no loopback socket available",
        caller.file(),
        caller.line()
    );
    true
}

/// Starts a wiremock server, or returns `None` when sockets are unavailable.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl std::future::Future<Output = Option<MockServer>> {
    let skip = should_skip_socket_bound_test();
    async move {
        if skip {
            None
        } else {
            Some(MockServer::start().await)
        }
    }
}
