use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::{Coll, Id};

/// The auditable account actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Registered,
    LoggedIn,
}

/// An append-only audit record. Entries are never read back by the server;
/// they exist for operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub user_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, user_id: Id) -> Self {
        Self {
            action,
            user_id,
            at: Utc::now(),
        }
    }
}

/// Append an audit entry, best-effort: a logging failure must never fail
/// the primary operation, so errors are logged and swallowed.
pub async fn record(audit: &Coll<AuditEntry>, entry: AuditEntry) {
    if let Err(e) = audit.insert_one(&entry, None).await {
        warn!(
            "failed to record audit entry {:?} for user {}: {e}",
            entry.action, entry.user_id
        );
    }
}
