//! Essay document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{hex_id, object_id, Metadata};
use crate::model::Essay;
use crate::types::Result;

/// Collection name for essays
pub const ESSAY_COLLECTION: &str = "essays";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EssayDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub student_id: String,
    pub application_id: String,
    pub title: String,
    pub prompt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub word_count: u32,
    pub word_limit: Option<u32>,
    pub status: String,
}

impl EssayDoc {
    pub fn from_model(e: &Essay) -> Result<Self> {
        Ok(Self {
            _id: Some(object_id(&e.id)?),
            metadata: Metadata::from_times(e.created_at, e.updated_at),
            student_id: e.student_id.clone(),
            application_id: e.application_id.clone(),
            title: e.title.clone(),
            prompt: e.prompt.clone(),
            content: e.content.clone(),
            word_count: e.word_count,
            word_limit: e.word_limit,
            status: e.status.clone(),
        })
    }

    pub fn into_model(self) -> Essay {
        Essay {
            id: hex_id(self._id),
            created_at: self.metadata.created(),
            updated_at: self.metadata.updated(),
            student_id: self.student_id,
            application_id: self.application_id,
            title: self.title,
            prompt: self.prompt,
            content: self.content,
            word_count: self.word_count,
            word_limit: self.word_limit,
            status: self.status,
        }
    }
}

impl IntoIndexes for EssayDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "student_id": 1, "application_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("student_application_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for EssayDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
