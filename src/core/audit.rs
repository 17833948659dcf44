//! Audit trail of store mutations.
//!
//! Every committed lifecycle operation emits one event. Sinks never fail an
//! operation: errors are logged and dropped.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::domain::User;
use crate::error::Result;

/// One audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    /// Email of the acting user
    pub user: String,
    pub user_id: String,
    pub operation: &'static str,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AuditEvent {
    pub fn new(user: &User, operation: &'static str) -> Self {
        Self {
            timestamp: Utc::now(),
            user: user.email.clone(),
            user_id: user.id.clone(),
            operation,
            fields: Map::new(),
        }
    }

    /// Attach a field.
    pub fn field(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.fields.insert(key.to_string(), value);
        self
    }
}

/// Destination for audit events.
pub trait AuditSink {
    fn record(&self, event: &AuditEvent) -> Result<()>;
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonLines {
    path: PathBuf,
}

impl JsonLines {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AuditSink for JsonLines {
    fn record(&self, event: &AuditEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl AuditSink for Discard {
    fn record(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }
}

/// Record an event, logging instead of failing.
pub fn emit(sink: &dyn AuditSink, event: AuditEvent) {
    debug!(operation = event.operation, "audit event");
    if let Err(e) = sink.record(&event) {
        warn!(operation = event.operation, error = %e, "failed to write audit event");
    }
}
