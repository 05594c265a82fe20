//! Application document schema

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{hex_id, object_id, Metadata};
use crate::model::Application;
use crate::types::Result;

/// Collection name for scholarship applications
pub const APPLICATION_COLLECTION: &str = "applications";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApplicationDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub student_id: String,
    pub scholarship_name: String,
    pub organization: Option<String>,
    pub amount: Option<f64>,
    /// Calendar date, stored as `YYYY-MM-DD`
    pub deadline: Option<NaiveDate>,
    pub status: String,
    pub url: Option<String>,
    pub notes: Option<String>,
}

impl ApplicationDoc {
    pub fn from_model(a: &Application) -> Result<Self> {
        Ok(Self {
            _id: Some(object_id(&a.id)?),
            metadata: Metadata::from_times(a.created_at, a.updated_at),
            student_id: a.student_id.clone(),
            scholarship_name: a.scholarship_name.clone(),
            organization: a.organization.clone(),
            amount: a.amount,
            deadline: a.deadline,
            status: a.status.clone(),
            url: a.url.clone(),
            notes: a.notes.clone(),
        })
    }

    pub fn into_model(self) -> Application {
        Application {
            id: hex_id(self._id),
            created_at: self.metadata.created(),
            updated_at: self.metadata.updated(),
            student_id: self.student_id,
            scholarship_name: self.scholarship_name,
            organization: self.organization,
            amount: self.amount,
            deadline: self.deadline,
            status: self.status,
            url: self.url,
            notes: self.notes,
        }
    }
}

impl IntoIndexes for ApplicationDoc {
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

impl MutMetadata for ApplicationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewApplication;

    #[test]
    fn test_deadline_stored_as_date_string() {
        let app = Application::create(
            "student-1",
            NewApplication {
                scholarship_name: Some("Merit Award".into()),
                deadline: Some("2030-03-15".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let doc = bson::to_document(&ApplicationDoc::from_model(&app).unwrap()).unwrap();
        assert_eq!(doc.get_str("deadline").unwrap(), "2030-03-15");

        let back: ApplicationDoc = bson::from_document(doc).unwrap();
        assert_eq!(back.into_model().deadline, app.deadline);
    }
}
