//! Invitation document schema, one per collaboration

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::model::{DeliveryStatus, Invitation};

/// Collection name for invitations
pub const INVITATION_COLLECTION: &str = "invitations";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InvitationDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub collaboration_id: String,
    pub student_id: String,
    pub recipient_email: Option<String>,
    /// SHA-256 hex of the current invite token
    pub token_hash: Option<String>,
    pub delivery_status: DeliveryStatus,
    #[serde(default)]
    pub last_outcome: Option<DeliveryStatus>,
    pub sent_at: Option<DateTime>,
    pub scheduled_for: Option<DateTime>,
    #[serde(default)]
    pub send_count: u32,
    pub last_error: Option<String>,
    pub viewed_at: Option<DateTime>,
}

impl InvitationDoc {
    /// Documents are keyed by `collaboration_id`; `_id` is left to the server
    pub fn from_model(i: &Invitation) -> Self {
        Self {
            _id: None,
            metadata: Metadata::from_times(i.created_at, i.updated_at),
            collaboration_id: i.collaboration_id.clone(),
            student_id: i.student_id.clone(),
            recipient_email: i.recipient_email.clone(),
            token_hash: i.token_hash.clone(),
            delivery_status: i.delivery_status,
            last_outcome: i.last_outcome,
            sent_at: i.sent_at.map(DateTime::from_chrono),
            scheduled_for: i.scheduled_for.map(DateTime::from_chrono),
            send_count: i.send_count,
            last_error: i.last_error.clone(),
            viewed_at: i.viewed_at.map(DateTime::from_chrono),
        }
    }

    pub fn into_model(self) -> Invitation {
        Invitation {
            created_at: self.metadata.created(),
            updated_at: self.metadata.updated(),
            collaboration_id: self.collaboration_id,
            student_id: self.student_id,
            recipient_email: self.recipient_email,
            token_hash: self.token_hash,
            delivery_status: self.delivery_status,
            last_outcome: self.last_outcome,
            sent_at: self.sent_at.map(|d| d.to_chrono()),
            scheduled_for: self.scheduled_for.map(|d| d.to_chrono()),
            send_count: self.send_count,
            last_error: self.last_error,
            viewed_at: self.viewed_at.map(|d| d.to_chrono()),
        }
    }
}

impl IntoIndexes for InvitationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "collaboration_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("collaboration_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "token_hash": 1 },
                Some(
                    IndexOptions::builder()
                        .sparse(true)
                        .name("token_hash_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for InvitationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_token_hash_persisted() {
        let mut invite = Invitation::new("c1", "s1", DeliveryStatus::Sent);
        invite.token_hash = Some("ab12".into());
        invite.sent_at = Some(Utc::now());

        let doc = bson::to_document(&InvitationDoc::from_model(&invite)).unwrap();
        assert_eq!(doc.get_str("token_hash").unwrap(), "ab12");
        assert_eq!(doc.get_str("delivery_status").unwrap(), "sent");
        assert!(doc.get_datetime("sent_at").is_ok());
    }
}
