//! Common metadata for all documents
//!
//! Tracks creation, update, and soft deletion timestamps.

use bson::DateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Whether this document has been soft-deleted
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Metadata carrying a record's own timestamps
    pub fn from_times(created_at: chrono::DateTime<Utc>, updated_at: chrono::DateTime<Utc>) -> Self {
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(DateTime::from_chrono(updated_at)),
            created_at: Some(DateTime::from_chrono(created_at)),
        }
    }

    pub fn created(&self) -> chrono::DateTime<Utc> {
        self.created_at.map(|d| d.to_chrono()).unwrap_or_default()
    }

    /// Falls back to the creation time for documents never updated
    pub fn updated(&self) -> chrono::DateTime<Utc> {
        self.updated_at
            .map(|d| d.to_chrono())
            .unwrap_or_else(|| self.created())
    }
}
