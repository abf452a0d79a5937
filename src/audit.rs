//! Audit trail sink.
//!
//! Services report every write (and selected reads) to an [`AuditSink`]. The
//! sink is best-effort: [`record_audit`] logs a failure and carries on, so a
//! broken audit backend never turns a successful operation into an error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Who is acting, as established by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Authenticated user id.
    pub user_id: Uuid,
    /// Client address, if known.
    pub ip_address: Option<String>,
    /// Correlation id of the request.
    pub request_id: Option<String>,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            ip_address: None,
            request_id: None,
        }
    }
}

/// Kind of audited access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entity name (e.g. `AttendancePeriod`).
    pub entity: String,
    /// Id of the affected record.
    pub record_id: Uuid,
    pub action: AuditAction,
    /// State before the change.
    pub old_values: Option<serde_json::Value>,
    /// State after the change.
    pub new_values: Option<serde_json::Value>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub request_id: Option<String>,
}

impl AuditEntry {
    /// Starts an entry for `record_id`, attributed to `actor`.
    pub fn new(entity: &str, record_id: Uuid, action: AuditAction, actor: &Actor) -> Self {
        Self {
            entity: entity.to_string(),
            record_id,
            action,
            old_values: None,
            new_values: None,
            user_id: Some(actor.user_id),
            ip_address: actor.ip_address.clone(),
            request_id: actor.request_id.clone(),
        }
    }

    /// Attaches the previous state.
    pub fn with_old<T: Serialize>(mut self, value: &T) -> Self {
        self.old_values = serde_json::to_value(value).ok();
        self
    }

    /// Attaches the new state.
    pub fn with_new<T: Serialize>(mut self, value: &T) -> Self {
        self.new_values = serde_json::to_value(value).ok();
        self
    }
}

/// Failure reported by an audit backend.
#[derive(Debug, Error)]
#[error("audit sink unavailable: {0}")]
pub struct AuditError(pub String);

/// Destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_audit(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Sends `entry` to `sink`, logging instead of failing.
pub async fn record_audit(sink: &dyn AuditSink, entry: AuditEntry) {
    let entity = entry.entity.clone();
    let record_id = entry.record_id;
    let action = entry.action;

    if let Err(e) = sink.log_audit(entry).await {
        warn!(
            entity = %entity,
            record_id = %record_id,
            action = ?action,
            error = %e,
            "Failed to write audit entry"
        );
    }
}

/// Writes audit entries as structured `tracing` events on target `audit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log_audit(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let old_values = entry.old_values.map(|v| v.to_string());
        let new_values = entry.new_values.map(|v| v.to_string());
        info!(
            target: "audit",
            entity = %entry.entity,
            record_id = %entry.record_id,
            action = ?entry.action,
            user_id = ?entry.user_id,
            ip_address = ?entry.ip_address,
            request_id = ?entry.request_id,
            old_values = ?old_values,
            new_values = ?new_values,
            "audit"
        );
        Ok(())
    }
}

/// Keeps entries in memory. Used by tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    failing: bool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            entries: Arc::default(),
            failing: true,
        }
    }

    /// Snapshot of the entries written so far.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn log_audit(&self, entry: AuditEntry) -> Result<(), AuditError> {
        if self.failing {
            return Err(AuditError("memory sink configured to fail".to_string()));
        }
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_audit_stores_entry() {
        let sink = MemoryAuditSink::new();
        let actor = Actor {
            user_id: Uuid::new_v4(),
            ip_address: Some("10.0.0.1".to_string()),
            request_id: Some("req-1".to_string()),
        };
        let record_id = Uuid::new_v4();

        let entry = AuditEntry::new("Employee", record_id, AuditAction::Create, &actor)
            .with_new(&serde_json::json!({ "full_name": "Ada" }));
        record_audit(&sink, entry).await;

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record_id, record_id);
        assert_eq!(entries[0].user_id, Some(actor.user_id));
        assert_eq!(entries[0].request_id.as_deref(), Some("req-1"));
        assert_eq!(entries[0].new_values.as_ref().unwrap()["full_name"], "Ada");
    }

    #[tokio::test]
    async fn test_record_audit_swallows_failures() {
        let sink = MemoryAuditSink::failing();
        let entry = AuditEntry::new(
            "Payslip",
            Uuid::new_v4(),
            AuditAction::Create,
            &Actor::new(Uuid::new_v4()),
        );
        record_audit(&sink, entry).await;
        assert!(sink.entries().await.is_empty());
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(
            serde_json::to_string(&AuditAction::Delete).unwrap(),
            "\"DELETE\""
        );
    }
}
