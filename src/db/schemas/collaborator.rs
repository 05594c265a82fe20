//! Collaborator document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{hex_id, object_id, Metadata};
use crate::model::{Collaborator, Relationship};
use crate::types::Result;

/// Collection name for collaborators
pub const COLLABORATOR_COLLECTION: &str = "collaborators";

/// Collaborator document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CollaboratorDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Owning student (identity provider user id)
    pub student_id: String,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Relationship,
    pub organization: Option<String>,
    pub notes: Option<String>,
}

impl CollaboratorDoc {
    pub fn from_model(c: &Collaborator) -> Result<Self> {
        Ok(Self {
            _id: Some(object_id(&c.id)?),
            metadata: Metadata::from_times(c.created_at, c.updated_at),
            student_id: c.student_id.clone(),
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            relationship: c.relationship,
            organization: c.organization.clone(),
            notes: c.notes.clone(),
        })
    }

    pub fn into_model(self) -> Collaborator {
        Collaborator {
            id: hex_id(self._id),
            created_at: self.metadata.created(),
            updated_at: self.metadata.updated(),
            student_id: self.student_id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            relationship: self.relationship,
            organization: self.organization,
            notes: self.notes,
        }
    }
}

impl IntoIndexes for CollaboratorDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "student_id": 1, "metadata.created_at": 1 },
            Some(
                IndexOptions::builder()
                    .name("student_created_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for CollaboratorDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewCollaborator;

    #[test]
    fn test_round_trips_through_document() {
        let c = Collaborator::create(
            "student-1",
            NewCollaborator {
                name: Some("Dr. Smith".into()),
                email: Some("smith@school.edu".into()),
                relationship: Some("teacher".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let doc = CollaboratorDoc::from_model(&c).unwrap();
        let bson_doc = bson::to_document(&doc).unwrap();
        assert_eq!(bson_doc.get_str("relationship").unwrap(), "teacher");

        let back: CollaboratorDoc = bson::from_document(bson_doc).unwrap();
        let model = back.into_model();
        assert_eq!(model.id, c.id);
        assert_eq!(model.email.as_deref(), Some("smith@school.edu"));
    }

    #[test]
    fn test_rejects_non_object_id() {
        let mut c = Collaborator::create(
            "s",
            NewCollaborator {
                name: Some("A".into()),
                ..Default::default()
            },
        )
        .unwrap();
        c.id = "not-an-id".into();
        assert!(CollaboratorDoc::from_model(&c).is_err());
    }
}
