//! Structured JSON-lines logging to stdout.
//!
//! Every event carries a timestamp, a monotonic sequence number, a module
//! name and a level; `LOG_LEVEL` and `LOG_MODULES` filter output at runtime.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => Level::Debug,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

fn module_enabled(module: &str) -> bool {
    // LOG_MODULES: comma-separated list or "all"
    match std::env::var("LOG_MODULES").as_deref() {
        Ok("all") | Err(_) => true,
        Ok(modules) => modules.split(',').any(|m| m.trim() == module),
    }
}

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub fn v_bool(b: bool) -> Value {
    Value::Bool(b)
}

pub fn json_log_at(level: Level, module: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !module_enabled(module) {
        return;
    }
    let mut line = Map::new();
    line.insert("ts".to_string(), Value::String(ts_now()));
    line.insert("seq".to_string(), Value::Number(next_seq().into()));
    line.insert("level".to_string(), Value::String(level.as_str().to_string()));
    line.insert("module".to_string(), Value::String(module.to_string()));
    for (k, v) in fields {
        line.insert(k, v);
    }
    println!("{}", Value::Object(line));
}

pub fn json_log(module: &str, fields: Map<String, Value>) {
    json_log_at(Level::Info, module, fields);
}
