//! Snapshot normalization.
//!
//! The backend has shipped several generations of key names (snake_case and
//! camelCase variants of the same KPI). Each canonical field resolves through
//! a static alias table, first present key wins; the snake_case name sits
//! first in every table, so it wins when a payload carries both spellings.
//! Normalization is total: no input shape raises, missing or malformed values
//! collapse to defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SNAPSHOT_TIME_ALIASES: &[&str] = &[
    "snapshot_time_utc",
    "snapshot_time",
    "snapshotUTC",
    "snapshotTimeUtc",
];

pub const ACTIVE_USERS_ALIASES: &[&str] = &["active_users", "activeUsers"];
pub const EMPJOB_ROWS_ALIASES: &[&str] = &["empjob_rows", "empJob_rows", "empJobRows"];
pub const CONTINGENT_WORKERS_ALIASES: &[&str] = &[
    "contingent_workers",
    "contingent_count",
    "contingent",
    "contingentWorkers",
];
pub const INACTIVE_USERS_ALIASES: &[&str] = &["inactive_users", "inactiveUsers"];
pub const MISSING_MANAGERS_ALIASES: &[&str] = &["missing_managers", "missingManagers"];
pub const INVALID_ORG_ALIASES: &[&str] = &["invalid_org", "invalidOrg"];
pub const MISSING_EMAILS_ALIASES: &[&str] = &[
    "missing_emails",
    "missing_email_count",
    "missingEmails",
    "missingEmailsCount",
];
pub const RISK_SCORE_ALIASES: &[&str] = &["risk_score", "riskScore"];

pub const MISSING_EMAILS_SAMPLE_ALIASES: &[&str] =
    &["missing_emails_sample", "missingEmailsSample"];
pub const INVALID_ORG_SAMPLE_ALIASES: &[&str] = &["invalid_org_sample", "invalidOrgSample"];
pub const MISSING_MANAGERS_SAMPLE_ALIASES: &[&str] =
    &["missing_managers_sample", "missingManagersSample"];
pub const INACTIVE_USERS_SAMPLE_ALIASES: &[&str] =
    &["inactive_users_sample", "inactiveUsersSample"];
pub const CONTINGENT_WORKERS_SAMPLE_ALIASES: &[&str] =
    &["contingent_workers_sample", "contingentWorkersSample"];

/// Normalized result of a `/run` or `/metrics/latest` call. KPI counters are
/// always present and non-negative; sample lists are capped for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub snapshot_time_utc: String,
    pub active_users: u64,
    pub empjob_rows: u64,
    pub contingent_workers: u64,
    pub inactive_users: u64,
    pub missing_managers: u64,
    pub invalid_org: u64,
    pub missing_emails: u64,
    pub risk_score: u64,
    pub missing_emails_sample: Vec<Value>,
    pub invalid_org_sample: Vec<Value>,
    pub missing_managers_sample: Vec<Value>,
    pub inactive_users_sample: Vec<Value>,
    pub contingent_workers_sample: Vec<Value>,
}

impl Default for SnapshotMetrics {
    fn default() -> Self {
        Self {
            snapshot_time_utc: "unknown".to_string(),
            active_users: 0,
            empjob_rows: 0,
            contingent_workers: 0,
            inactive_users: 0,
            missing_managers: 0,
            invalid_org: 0,
            missing_emails: 0,
            risk_score: 0,
            missing_emails_sample: Vec::new(),
            invalid_org_sample: Vec::new(),
            missing_managers_sample: Vec::new(),
            inactive_users_sample: Vec::new(),
            contingent_workers_sample: Vec::new(),
        }
    }
}

fn first_present<'a>(raw: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    let obj = raw.as_object()?;
    aliases.iter().find_map(|k| obj.get(*k))
}

/// Coerce any JSON value to a non-negative counter. Numbers truncate,
/// stringified numbers parse, booleans count as 0/1, everything else is 0.
fn coerce_count(v: &Value) -> u64 {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.max(0) as u64
            } else if let Some(u) = n.as_u64() {
                u
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f as u64)
                    .unwrap_or(0)
            }
        }
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .map(|i| i.max(0) as u64)
                .ok()
                .or_else(|| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or(0)
        }
        Value::Bool(b) => *b as u64,
        _ => 0,
    }
}

fn resolve_count(raw: &Value, aliases: &[&str]) -> u64 {
    first_present(raw, aliases).map(coerce_count).unwrap_or(0)
}

/// Non-list values are treated as absent, not as errors.
fn resolve_sample(raw: &Value, aliases: &[&str], cap: usize) -> Vec<Value> {
    match first_present(raw, aliases) {
        Some(Value::Array(rows)) => rows.iter().take(cap).cloned().collect(),
        _ => Vec::new(),
    }
}

fn resolve_time(raw: &Value) -> String {
    match first_present(raw, SNAPSHOT_TIME_ALIASES) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => "unknown".to_string(),
    }
}

/// Normalize a raw metrics payload. Total over any JSON value: non-objects
/// produce the all-defaults snapshot.
pub fn normalize(raw: &Value, sample_cap: usize) -> SnapshotMetrics {
    SnapshotMetrics {
        snapshot_time_utc: resolve_time(raw),
        active_users: resolve_count(raw, ACTIVE_USERS_ALIASES),
        empjob_rows: resolve_count(raw, EMPJOB_ROWS_ALIASES),
        contingent_workers: resolve_count(raw, CONTINGENT_WORKERS_ALIASES),
        inactive_users: resolve_count(raw, INACTIVE_USERS_ALIASES),
        missing_managers: resolve_count(raw, MISSING_MANAGERS_ALIASES),
        invalid_org: resolve_count(raw, INVALID_ORG_ALIASES),
        missing_emails: resolve_count(raw, MISSING_EMAILS_ALIASES),
        risk_score: resolve_count(raw, RISK_SCORE_ALIASES),
        missing_emails_sample: resolve_sample(raw, MISSING_EMAILS_SAMPLE_ALIASES, sample_cap),
        invalid_org_sample: resolve_sample(raw, INVALID_ORG_SAMPLE_ALIASES, sample_cap),
        missing_managers_sample: resolve_sample(raw, MISSING_MANAGERS_SAMPLE_ALIASES, sample_cap),
        inactive_users_sample: resolve_sample(raw, INACTIVE_USERS_SAMPLE_ALIASES, sample_cap),
        contingent_workers_sample: resolve_sample(
            raw,
            CONTINGENT_WORKERS_SAMPLE_ALIASES,
            sample_cap,
        ),
    }
}
