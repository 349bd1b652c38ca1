//! Integration tests for the HTTP client against a canned-response server.
//!
//! Each test spins a one-shot TCP listener that reads a full request and
//! answers with a fixed HTTP/1.1 response, so the wire behavior (status
//! handling, detail extraction, status discriminator) is exercised without a
//! real backend.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ecgate::client::{Backend, BackendError, HttpBackend, LatestOutcome, RunRequest};
use ecgate::state::Config;

fn headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            if k.eq_ignore_ascii_case("content-length") {
                v.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Serve exactly one request with a fixed response, then close.
async fn serve_once(status_line: &'static str, body: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = sock.read(&mut tmp).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(end) = headers_end(&buf) {
                if buf.len() >= end + content_length(&buf[..end]) {
                    break;
                }
            }
        }
        let resp = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = sock.write_all(resp.as_bytes()).await;
        let _ = sock.shutdown().await;
    });
    addr
}

fn config_for(addr: SocketAddr) -> Config {
    Config {
        backend_url: format!("http://{}", addr),
        instance_url: "https://hcm41.sapsf.com".to_string(),
        api_base_override: String::new(),
        username: "jdoe".to_string(),
        password: "s3cret".to_string(),
        company_id: "ACME".to_string(),
        health_timeout_secs: 5,
        run_timeout_secs: 5,
        latest_timeout_secs: 5,
        upstream_timeout_secs: 60,
        verify_ssl: true,
        sample_cap: 2,
        refresh_secs: 300,
    }
}

fn run_request() -> RunRequest {
    RunRequest {
        instance_url: "https://hcm41.sapsf.com".to_string(),
        api_base_url: "https://api41.sapsf.com".to_string(),
        username: "jdoe@ACME".to_string(),
        password: "s3cret".to_string(),
        company_id: Some("ACME".to_string()),
        timeout: 60,
        verify_ssl: true,
    }
}

#[tokio::test]
async fn health_ok() {
    let addr = serve_once("200 OK", r#"{"ok": true}"#.to_string()).await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let health = backend.health().await;
    assert!(health.ok, "message: {}", health.message);
}

#[tokio::test]
async fn health_unexpected_body_is_not_ok() {
    let addr = serve_once("200 OK", r#"{"status": "fine"}"#.to_string()).await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let health = backend.health().await;
    assert!(!health.ok);
    assert!(health.message.contains("unexpected"));
}

#[tokio::test]
async fn health_network_failure_returns_value_not_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let health = backend.health().await;
    assert!(!health.ok);
    assert!(!health.message.is_empty());
}

#[tokio::test]
async fn latest_empty_is_a_state_not_an_error() {
    let addr = serve_once("200 OK", r#"{"status": "empty"}"#.to_string()).await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let outcome = backend.latest("https://hcm41.sapsf.com", "ACME").await.unwrap();
    assert_eq!(outcome, LatestOutcome::Empty);
}

#[tokio::test]
async fn latest_normalizes_camel_case_payload() {
    let body = r#"{"status": "ok", "metrics": {"activeUsers": 3, "riskScore": "12", "missingEmailsSample": [{"a":1},{"a":2},{"a":3}]}}"#;
    let addr = serve_once("200 OK", body.to_string()).await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    match backend.latest("https://hcm41.sapsf.com", "").await.unwrap() {
        LatestOutcome::Snapshot(m) => {
            assert_eq!(m.active_users, 3);
            assert_eq!(m.risk_score, 12);
            // sample_cap = 2 in the test config
            assert_eq!(m.missing_emails_sample.len(), 2);
            assert_eq!(m.snapshot_time_utc, "unknown");
        }
        LatestOutcome::Empty => panic!("expected snapshot"),
    }
}

#[tokio::test]
async fn run_surfaces_backend_detail_with_status() {
    let addr =
        serve_once("422 Unprocessable Entity", r#"{"detail": "upstream auth failed"}"#.to_string())
            .await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let err = backend.run(&run_request()).await.unwrap_err();
    let be = err.downcast_ref::<BackendError>().expect("BackendError");
    assert_eq!(be.status, 422);
    assert_eq!(be.detail, "upstream auth failed");
}

#[tokio::test]
async fn run_truncates_raw_error_bodies() {
    let body = format!("Traceback (most recent call last): {}", "x".repeat(2000));
    let addr = serve_once("500 Internal Server Error", body).await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let err = backend.run(&run_request()).await.unwrap_err();
    let be = err.downcast_ref::<BackendError>().expect("BackendError");
    assert_eq!(be.status, 500);
    assert!(be.detail.chars().count() <= 600);
}

#[tokio::test]
async fn run_normalizes_metrics_envelope() {
    let body = r#"{"metrics": {"active_users": 7, "empjob_rows": 11, "snapshot_time_utc": "2024-03-01T00:00:00Z"}}"#;
    let addr = serve_once("200 OK", body.to_string()).await;
    let backend = HttpBackend::new(&config_for(addr)).unwrap();
    let m = backend.run(&run_request()).await.unwrap();
    assert_eq!(m.active_users, 7);
    assert_eq!(m.empjob_rows, 11);
    assert_eq!(m.snapshot_time_utc, "2024-03-01T00:00:00Z");
}
