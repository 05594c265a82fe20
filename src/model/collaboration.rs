//! Collaborations: one tracked task for a collaborator on an application

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{ActionParty, CollaborationStatus, CollaborationType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    pub id: String,
    pub student_id: String,
    pub collaborator_id: String,
    pub application_id: String,
    pub essay_id: Option<String>,
    pub collaboration_type: CollaborationType,
    pub status: CollaborationStatus,
    /// Always serialized, `null` when nobody is expected to act
    pub awaiting_action_from: Option<ActionParty>,
    pub next_action_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub portal_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional list filters (`?applicationId=..&status=..`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaborationFilter {
    pub application_id: Option<String>,
    pub collaborator_id: Option<String>,
    pub status: Option<CollaborationStatus>,
}

impl CollaborationFilter {
    pub fn for_application(application_id: &str) -> Self {
        Self {
            application_id: Some(application_id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, c: &Collaboration) -> bool {
        self.application_id
            .as_deref()
            .map_or(true, |id| c.application_id == id)
            && self
                .collaborator_id
                .as_deref()
                .map_or(true, |id| c.collaborator_id == id)
            && self.status.map_or(true, |s| c.status == s)
    }
}
