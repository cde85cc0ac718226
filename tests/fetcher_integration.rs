//! Integration tests for the retrying fetcher against a mock HTTP server.

use std::sync::Arc;

use go_installer::download::{Cause, ClientTimeouts, Fetcher, RetryPolicy, build_client};
use reqwest::Client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::{
    CountingTransport, closed_port_url, should_skip_socket_bound_test, start_mock_server_or_skip,
};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

fn get(url: &str) -> reqwest::Request {
    Client::new().get(url).build().unwrap()
}

fn fetcher(max_retries: u32) -> Fetcher {
    Fetcher::new(Arc::new(Client::new()), RetryPolicy::without_delay(max_retries))
}

#[tokio::test]
async fn test_fetch_success_on_first_attempt() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/go.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetched = fetcher(3)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(fetched.attempts, 1);
    assert_eq!(fetched.response.bytes().await.unwrap().as_ref(), b"archive");
}

#[tokio::test]
async fn test_fetch_retries_503_then_succeeds_on_fourth_attempt() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/go.tar.gz"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .with_priority(1)
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/go.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .with_priority(2)
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetched = fetcher(3)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(fetched.attempts, 4);
}

#[tokio::test]
async fn test_fetch_404_is_not_retried() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/missing.tar.gz"))
        .respond_with(ResponseTemplate::new(404).set_body_string("secret body text"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = fetcher(3)
        .execute(get(&format!("{}/missing.tar.gz", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(404));
    assert!(matches!(error.cause(), Cause::DownloadFailed));
    let msg = error.to_string();
    assert!(msg.contains("Not Found"), "{msg}");
    assert!(!msg.contains("secret body text"), "{msg}");
}

#[tokio::test]
async fn test_fetch_persistent_500_exhausts_four_attempts() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&mock_server)
        .await;

    let error = fetcher(3)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(500));
}

#[tokio::test]
async fn test_fetch_retries_429() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let fetched = fetcher(3)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(fetched.attempts, 2);
}

#[tokio::test]
async fn test_fetch_zero_retries_makes_single_attempt() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = fetcher(0)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(502));
}

#[tokio::test]
async fn test_fetch_non_200_success_status_is_failure() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = fetcher(3)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(error.status_code(), Some(204));
}

#[tokio::test]
async fn test_fetch_transport_errors_are_retried_until_exhausted() {
    if should_skip_socket_bound_test() {
        return;
    }
    let transport = CountingTransport::new();
    let fetcher = Fetcher::new(transport.clone(), RetryPolicy::without_delay(3));

    let error = fetcher.execute(get(&closed_port_url())).await.unwrap_err();

    assert_eq!(transport.sends(), 4);
    assert_eq!(error.status_code(), Some(0));
    assert!(matches!(error.cause(), Cause::Transport(_)));
}

#[tokio::test]
async fn test_fetch_reports_missing_security_headers() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Content-Type-Options", "nosniff")
                .insert_header("X-Frame-Options", "DENY"),
        )
        .mount(&mock_server)
        .await;

    let fetched = fetcher(0)
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap();

    let warnings = fetched.warnings.into_vec();
    assert_eq!(
        warnings,
        vec![
            "missing security header: Content-Security-Policy".to_string(),
            "missing security header: X-XSS-Protection".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_redirect_to_private_address_is_refused_without_retry() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/go.tar.gz"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://192.168.0.1/evil.tar.gz"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_client(ClientTimeouts::default()).unwrap();
    let transport = CountingTransport::with_client(client);
    let fetcher = Fetcher::new(transport.clone(), RetryPolicy::without_delay(3));

    let error = fetcher
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(transport.sends(), 1);
    assert_eq!(error.status_code(), Some(0));
    assert!(matches!(error.cause(), Cause::Transport(_)), "{error:?}");
    assert!(!error.to_string().contains("192.168.0.1"), "{error}");
}

#[tokio::test]
async fn test_redirect_to_plain_http_is_refused() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/go.tar.gz"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", "http://downloads.example.com/go.tar.gz"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_client(ClientTimeouts::default()).unwrap();
    let transport = CountingTransport::with_client(client);
    let fetcher = Fetcher::new(transport.clone(), RetryPolicy::without_delay(3));

    let error = fetcher
        .execute(get(&format!("{}/go.tar.gz", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(transport.sends(), 1);
    assert_eq!(error.status_code(), Some(0));
}
