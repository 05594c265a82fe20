//! Collaboration history entries (append-only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::HistoryAction;
use crate::model::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub collaboration_id: String,
    pub action: HistoryAction,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(collaboration_id: &str, action: HistoryAction, details: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            collaboration_id: collaboration_id.to_string(),
            action,
            details: details.into(),
            created_at: Utc::now(),
        }
    }
}
