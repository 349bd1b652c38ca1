//! Thin HTTP wrapper over the health-check backend.
//!
//! Three operations: GET /health, POST /run, GET /metrics/latest. Network
//! failures and non-2xx responses never escape as raw reqwest errors to the
//! render layer: health degrades to `ok=false` with a message, run/latest
//! surface a `BackendError` carrying the HTTP status and the backend `detail`
//! text (truncated when only a raw body is available). No retries here —
//! the caller decides.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::metrics::{self, SnapshotMetrics};
use crate::state::Config;
use crate::urls;

/// Cap on raw response bodies echoed into error messages.
const DETAIL_CAP: usize = 600;

/// Non-2xx backend response, with the `detail` JSON field when present.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub status: u16,
    pub detail: String,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend returned HTTP {}: {}", self.status, self.detail)
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub ok: bool,
    pub message: String,
}

/// Body of POST /run. Field names are the backend's wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub instance_url: String,
    pub api_base_url: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    pub timeout: u64,
    pub verify_ssl: bool,
}

/// GET /metrics/latest outcome: `empty` means no snapshot exists yet for the
/// scope, which is a state and not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestOutcome {
    Snapshot(SnapshotMetrics),
    Empty,
}

#[async_trait]
pub trait Backend {
    async fn health(&self) -> HealthStatus;
    async fn run(&self, req: &RunRequest) -> Result<SnapshotMetrics>;
    async fn latest(&self, instance_url: &str, company_id: &str) -> Result<LatestOutcome>;
}

pub struct HttpBackend {
    client: Client,
    base: String,
    health_timeout: Duration,
    run_timeout: Duration,
    latest_timeout: Duration,
    sample_cap: usize,
}

impl HttpBackend {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: urls::normalize(&cfg.backend_url),
            health_timeout: Duration::from_secs(cfg.health_timeout_secs),
            run_timeout: Duration::from_secs(cfg.run_timeout_secs),
            latest_timeout: Duration::from_secs(cfg.latest_timeout_secs),
            sample_cap: cfg.sample_cap,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(DETAIL_CAP).collect::<String>().trim().to_string()
}

/// Prefer the backend's JSON `detail` field; fall back to the truncated raw
/// body so stack traces never dump into the UI whole.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| truncate_body(body))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> HealthStatus {
        let url = self.endpoint("/health");
        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body: Value = resp.json().await.unwrap_or(Value::Null);
                if body.get("ok").and_then(Value::as_bool) == Some(true) {
                    HealthStatus { ok: true, message: "backend reachable".to_string() }
                } else {
                    HealthStatus {
                        ok: false,
                        message: "backend reachable, but health returned unexpected response"
                            .to_string(),
                    }
                }
            }
            Ok(resp) => HealthStatus {
                ok: false,
                message: format!("health returned HTTP {}", resp.status().as_u16()),
            },
            Err(e) => HealthStatus { ok: false, message: format!("backend not reachable: {}", e) },
        }
    }

    async fn run(&self, req: &RunRequest) -> Result<SnapshotMetrics> {
        let resp = self
            .client
            .post(self.endpoint("/run"))
            .timeout(self.run_timeout)
            .json(req)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(
                BackendError { status: status.as_u16(), detail: extract_detail(&body) }.into()
            );
        }
        let parsed: Value = serde_json::from_str(&body)?;
        let raw = parsed.get("metrics").unwrap_or(&Value::Null);
        Ok(metrics::normalize(raw, self.sample_cap))
    }

    async fn latest(&self, instance_url: &str, company_id: &str) -> Result<LatestOutcome> {
        let mut query: Vec<(&str, &str)> = vec![("instance_url", instance_url)];
        if !company_id.is_empty() {
            query.push(("company_id", company_id));
        }
        let resp = self
            .client
            .get(self.endpoint("/metrics/latest"))
            .query(&query)
            .timeout(self.latest_timeout)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(
                BackendError { status: status.as_u16(), detail: extract_detail(&body) }.into()
            );
        }
        let parsed: Value = serde_json::from_str(&body)?;
        match parsed.get("status").and_then(Value::as_str) {
            Some("ok") => {
                let raw = parsed.get("metrics").unwrap_or(&Value::Null);
                Ok(LatestOutcome::Snapshot(metrics::normalize(raw, self.sample_cap)))
            }
            // "empty" and anything unrecognized both mean: nothing to show.
            _ => Ok(LatestOutcome::Empty),
        }
    }
}
