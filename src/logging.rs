//! Structured, human-readable logging for the order tools.
//!
//! Every record is one line:
//! `<ts> - <LEVEL> - [<domain>] <event>: <msg> key=value ...`
//! written to stderr and, once [`init`] has been called, appended to the
//! log file. Secrets are redacted before formatting.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Market,   // Ticker lookups, price context
    Exec,     // Order placement and cancellation
    Account,  // Balances, open orders
    Validate, // Input checks
    Config,   // Credentials, client setup
    System,   // Startup, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Market => "market",
            Domain::Exec => "exec",
            Domain::Account => "account",
            Domain::Validate => "validate",
            Domain::Config => "config",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Sink
// =============================================================================

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

/// Open (or create) the append-only log file. Later calls are no-ops.
pub fn init(path: &Path) -> std::io::Result<()> {
    if LOG_FILE.get().is_some() {
        return Ok(());
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["X-MBX-APIKEY", "api_key", "api_secret", "signature"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() || s.contains(char::is_whitespace) => format!("{:?}", s),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render one record without emitting it.
pub fn format_line(ts: &str, level: Level, domain: Domain, event: &str, fields: Map<String, Value>) -> String {
    let mut fields = sanitize_fields(fields);
    let msg = match fields.remove("msg") {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let mut line = format!(
        "{} - {} - [{}] {}",
        ts,
        level.as_str().to_uppercase(),
        domain.as_str(),
        event
    );
    if !msg.is_empty() {
        line.push_str(": ");
        line.push_str(&msg);
    }
    for (k, v) in &fields {
        line.push(' ');
        line.push_str(k);
        line.push('=');
        line.push_str(&render_value(v));
    }
    line
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let line = format_line(&ts_now(), level, domain, event, fields);
    eprintln!("{}", line);
    if let Some(file) = LOG_FILE.get() {
        if let Ok(mut f) = file.lock() {
            let _ = writeln!(f, "{}", line);
        }
    }
}

pub fn info(domain: Domain, event: &str, msg: &str) {
    log(Level::Info, domain, event, obj(&[("msg", v_str(msg))]));
}

pub fn warn(domain: Domain, event: &str, msg: &str) {
    log(Level::Warn, domain, event, obj(&[("msg", v_str(msg))]));
}

pub fn error(domain: Domain, event: &str, msg: &str) {
    log(Level::Error, domain, event, obj(&[("msg", v_str(msg))]));
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_order_submit(kind: &str, symbol: &str, side: &str, qty: f64, price: Option<f64>, stop_price: Option<f64>) {
    log(
        Level::Info,
        Domain::Exec,
        "order_submit",
        obj(&[
            ("kind", v_str(kind)),
            ("symbol", v_str(symbol)),
            ("side", v_str(side)),
            ("qty", v_num(qty)),
            ("price", price.map(v_num).unwrap_or(Value::Null)),
            ("stop_price", stop_price.map(v_num).unwrap_or(Value::Null)),
        ]),
    );
}

pub fn log_order_placed(order_id: u64, symbol: &str, side: &str, order_type: &str, status: &str) {
    log(
        Level::Info,
        Domain::Exec,
        "order_placed",
        obj(&[
            ("order_id", json!(order_id)),
            ("symbol", v_str(symbol)),
            ("side", v_str(side)),
            ("type", v_str(order_type)),
            ("status", v_str(status)),
        ]),
    );
}

pub fn log_order_failed(stage: &str, kind: &str, err: &str) {
    log(
        Level::Error,
        Domain::Exec,
        "order_failed",
        obj(&[("stage", v_str(stage)), ("error_kind", v_str(kind)), ("msg", v_str(err))]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

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
    json!(n)
}

// =============================================================================
// Tests
// =============================================================================
