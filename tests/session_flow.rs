//! End-to-end session lifecycle against a stub backend: validate, health,
//! lock, fetch, logout — with call counting so "no HTTP before validation
//! passes" is checked directly.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use ecgate::client::{Backend, HealthStatus, LatestOutcome, RunRequest};
use ecgate::metrics::{self, SnapshotMetrics};
use ecgate::session::{Event, FetchStatus, Field, SessionState, TenantSession};

#[derive(Default)]
struct StubBackend {
    calls: AtomicUsize,
    latest_empty: bool,
}

impl StubBackend {
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn health(&self) -> HealthStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HealthStatus { ok: true, message: "backend reachable".to_string() }
    }

    async fn run(&self, req: &RunRequest) -> Result<SnapshotMetrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(req.username.contains('@'), "identity must be fully qualified");
        Ok(metrics::normalize(&json!({"active_users": 2, "missing_emails": 1}), 50))
    }

    async fn latest(&self, _instance_url: &str, _company_id: &str) -> Result<LatestOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.latest_empty {
            Ok(LatestOutcome::Empty)
        } else {
            Ok(LatestOutcome::Snapshot(SnapshotMetrics::default()))
        }
    }
}

fn filled_session() -> TenantSession {
    let mut s = TenantSession::default();
    for (field, value) in [
        (Field::BackendUrl, "https://gates.example.onrender.com"),
        (Field::InstanceUrl, "https://hcm41.sapsf.com"),
        (Field::Username, "jdoe"),
        (Field::Password, "s3cret"),
        (Field::CompanyId, "ACME"),
    ] {
        s.apply(Event::Edit { field, value: value.to_string() }).unwrap();
    }
    s
}

#[tokio::test]
async fn lock_run_logout_cycle() {
    let backend = StubBackend::default();
    let mut session = filled_session();

    let conn = session.validate().expect("form should validate");
    assert!(backend.health().await.ok);
    session.lock(conn).unwrap();
    assert_eq!(session.state(), SessionState::Locked);

    let conn = session.connection().cloned().unwrap();
    let req = RunRequest {
        instance_url: conn.instance_url.clone(),
        api_base_url: conn.api_base.clone(),
        username: conn.effective_username(),
        password: conn.password.clone(),
        company_id: Some(conn.company_id.clone()),
        timeout: 60,
        verify_ssl: true,
    };
    let m = backend.run(&req).await.unwrap();
    session.set_snapshot(m).unwrap();
    assert_eq!(session.snapshot().unwrap().active_users, 2);
    assert_eq!(session.last_status(), Some(FetchStatus::Ok));

    session.apply(Event::Logout).unwrap();
    assert_eq!(session.state(), SessionState::Unset);
    assert!(session.snapshot().is_none());
    assert!(session.form().password.is_empty());
}

#[tokio::test]
async fn empty_password_blocks_before_any_http() {
    let backend = StubBackend::default();
    let mut session = filled_session();
    session.apply(Event::Edit { field: Field::Password, value: String::new() }).unwrap();

    let errors = session.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.field == Field::Password));
    // validation failed, so the caller never got far enough to probe /health
    assert_eq!(backend.call_count(), 0);
    assert_eq!(session.state(), SessionState::Unset);
}

#[tokio::test]
async fn empty_latest_yields_no_snapshot_state() {
    let backend = StubBackend { latest_empty: true, ..Default::default() };
    let mut session = filled_session();
    let conn = session.validate().unwrap();
    session.lock(conn).unwrap();

    let conn = session.connection().cloned().unwrap();
    match backend.latest(&conn.instance_url, &conn.company_id).await.unwrap() {
        LatestOutcome::Empty => session.record_empty().unwrap(),
        LatestOutcome::Snapshot(m) => session.set_snapshot(m).unwrap(),
    }
    assert!(session.snapshot().is_none());
    assert_eq!(session.last_status(), Some(FetchStatus::Empty));
}

#[tokio::test]
async fn zero_valued_snapshot_differs_from_empty() {
    let backend = StubBackend::default();
    let mut session = filled_session();
    let conn = session.validate().unwrap();
    session.lock(conn).unwrap();

    let conn = session.connection().cloned().unwrap();
    match backend.latest(&conn.instance_url, &conn.company_id).await.unwrap() {
        LatestOutcome::Empty => session.record_empty().unwrap(),
        LatestOutcome::Snapshot(m) => session.set_snapshot(m).unwrap(),
    }
    // all counters are zero, but this is loaded data, not the empty state
    assert!(session.snapshot().is_some());
    assert_eq!(session.snapshot().unwrap().active_users, 0);
    assert_eq!(session.last_status(), Some(FetchStatus::Ok));
}

#[tokio::test]
async fn locked_fields_stay_frozen_until_logout() {
    let mut session = filled_session();
    let conn = session.validate().unwrap();
    session.lock(conn).unwrap();

    session
        .apply(Event::Edit { field: Field::InstanceUrl, value: "https://hcm9.sapsf.com".to_string() })
        .unwrap();
    assert_eq!(session.form().instance_url, "https://hcm41.sapsf.com");

    session.apply(Event::Logout).unwrap();
    session
        .apply(Event::Edit { field: Field::InstanceUrl, value: "https://hcm9.sapsf.com".to_string() })
        .unwrap();
    assert_eq!(session.form().instance_url, "https://hcm9.sapsf.com");
}
