//! Collaboration history document schema (append-only)

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{hex_id, object_id, Metadata};
use crate::lifecycle::HistoryAction;
use crate::model::HistoryEntry;
use crate::types::Result;

/// Collection name for history entries
pub const HISTORY_COLLECTION: &str = "collaboration_history";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HistoryDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub collaboration_id: String,
    pub action: HistoryAction,
    #[serde(default)]
    pub details: String,
}

impl HistoryDoc {
    pub fn from_model(h: &HistoryEntry) -> Result<Self> {
        Ok(Self {
            _id: Some(object_id(&h.id)?),
            metadata: Metadata::from_times(h.created_at, h.created_at),
            collaboration_id: h.collaboration_id.clone(),
            action: h.action,
            details: h.details.clone(),
        })
    }

    pub fn into_model(self) -> HistoryEntry {
        HistoryEntry {
            id: hex_id(self._id),
            created_at: self.metadata.created(),
            collaboration_id: self.collaboration_id,
            action: self.action,
            details: self.details,
        }
    }
}

impl IntoIndexes for HistoryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "collaboration_id": 1, "metadata.created_at": 1, "_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("collaboration_timeline_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for HistoryDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
