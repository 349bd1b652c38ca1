//! Plain-text rendering of a normalized snapshot: a tile grid for the KPI
//! counters and one table per sample category. Pure string builders, no I/O.

use serde_json::Value;

use crate::metrics::SnapshotMetrics;

const TILES_PER_ROW: usize = 4;
const MAX_CELL_WIDTH: usize = 24;

pub fn tiles(m: &SnapshotMetrics) -> String {
    let entries: [(&str, u64); 8] = [
        ("Active users", m.active_users),
        ("EmpJob rows", m.empjob_rows),
        ("Contingent", m.contingent_workers),
        ("Inactive users", m.inactive_users),
        ("Missing managers", m.missing_managers),
        ("Invalid org", m.invalid_org),
        ("Missing emails", m.missing_emails),
        ("Risk score", m.risk_score),
    ];
    let mut out = String::new();
    for row in entries.chunks(TILES_PER_ROW) {
        for (label, value) in row {
            out.push_str(&format!("{:<18}{:>8}    ", label, value));
        }
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }
    out
}

fn cell(v: &Value) -> String {
    let text = match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        let mut cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        cut.push('…');
        cut
    } else {
        text
    }
}

/// Render sample rows as a pipe-separated table. Column order follows the
/// first row's keys; rows missing a column render an empty cell.
pub fn sample_table(title: &str, rows: &[Value]) -> String {
    let mut out = format!("## {}\n", title);
    let columns: Vec<String> = rows
        .iter()
        .find_map(|r| r.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    if columns.is_empty() {
        out.push_str("(no sample data available)\n");
        return out;
    }
    out.push_str(&columns.join(" | "));
    out.push('\n');
    for row in rows {
        let Some(obj) = row.as_object() else { continue };
        let line: Vec<String> = columns
            .iter()
            .map(|c| obj.get(c).map(cell).unwrap_or_default())
            .collect();
        out.push_str(&line.join(" | "));
        out.push('\n');
    }
    out
}

/// Full snapshot view: caption, tiles, then one section per category.
pub fn snapshot(m: &SnapshotMetrics) -> String {
    let mut out = format!("Snapshot UTC: {}\n\n", m.snapshot_time_utc);
    out.push_str(&tiles(m));
    out.push('\n');
    for (title, rows) in [
        ("Missing emails (sample)", &m.missing_emails_sample),
        ("Invalid org assignments (sample)", &m.invalid_org_sample),
        ("Missing managers (sample)", &m.missing_managers_sample),
        ("Inactive users (sample)", &m.inactive_users_sample),
        ("Contingent workers (sample)", &m.contingent_workers_sample),
    ] {
        out.push_str(&sample_table(title, rows));
        out.push('\n');
    }
    out
}
