//! Collaboration document schema

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{hex_id, object_id, Metadata};
use crate::lifecycle::{ActionParty, CollaborationStatus, CollaborationType};
use crate::model::Collaboration;
use crate::types::Result;

/// Collection name for collaborations
pub const COLLABORATION_COLLECTION: &str = "collaborations";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CollaborationDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub student_id: String,
    pub collaborator_id: String,
    pub application_id: String,
    pub essay_id: Option<String>,
    pub collaboration_type: CollaborationType,
    #[serde(default)]
    pub status: CollaborationStatus,
    pub awaiting_action_from: Option<ActionParty>,
    pub next_action_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub portal_url: Option<String>,
}

impl CollaborationDoc {
    pub fn from_model(c: &Collaboration) -> Result<Self> {
        Ok(Self {
            _id: Some(object_id(&c.id)?),
            metadata: Metadata::from_times(c.created_at, c.updated_at),
            student_id: c.student_id.clone(),
            collaborator_id: c.collaborator_id.clone(),
            application_id: c.application_id.clone(),
            essay_id: c.essay_id.clone(),
            collaboration_type: c.collaboration_type,
            status: c.status,
            awaiting_action_from: c.awaiting_action_from,
            next_action_due_date: c.next_action_due_date,
            notes: c.notes.clone(),
            portal_url: c.portal_url.clone(),
        })
    }

    pub fn into_model(self) -> Collaboration {
        Collaboration {
            id: hex_id(self._id),
            created_at: self.metadata.created(),
            updated_at: self.metadata.updated(),
            student_id: self.student_id,
            collaborator_id: self.collaborator_id,
            application_id: self.application_id,
            essay_id: self.essay_id,
            collaboration_type: self.collaboration_type,
            status: self.status,
            awaiting_action_from: self.awaiting_action_from,
            next_action_due_date: self.next_action_due_date,
            notes: self.notes,
            portal_url: self.portal_url,
        }
    }
}

impl IntoIndexes for CollaborationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "student_id": 1, "application_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("student_application_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "collaborator_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("collaborator_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for CollaborationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
