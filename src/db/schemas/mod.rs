//! MongoDB document schemas
//!
//! Each document mirrors a record in `crate::model` and converts to and
//! from it. Record ids are the document `_id` in hex.

pub mod application;
pub mod collaboration;
pub mod collaborator;
pub mod essay;
pub mod history;
pub mod invitation;
pub mod metadata;

pub use application::{ApplicationDoc, APPLICATION_COLLECTION};
pub use collaboration::{CollaborationDoc, COLLABORATION_COLLECTION};
pub use collaborator::{CollaboratorDoc, COLLABORATOR_COLLECTION};
pub use essay::{EssayDoc, ESSAY_COLLECTION};
pub use history::{HistoryDoc, HISTORY_COLLECTION};
pub use invitation::{InvitationDoc, INVITATION_COLLECTION};
pub use metadata::Metadata;

use bson::oid::ObjectId;

use crate::types::Result;

/// Parse a record id into a document id
pub fn object_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id)?)
}

/// Hex id of a stored document
fn hex_id(id: Option<ObjectId>) -> String {
    id.map(|oid| oid.to_hex()).unwrap_or_default()
}
