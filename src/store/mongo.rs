//! MongoDB repository
//!
//! Records are documents keyed by their ObjectId; owner scoping is part of
//! every filter. An id that is not a valid ObjectId cannot name a stored
//! record, so lookups with one report "not found" instead of an error.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};

use crate::db::schemas::{
    ApplicationDoc, CollaborationDoc, CollaboratorDoc, EssayDoc, HistoryDoc, InvitationDoc,
    APPLICATION_COLLECTION, COLLABORATION_COLLECTION, COLLABORATOR_COLLECTION, ESSAY_COLLECTION,
    HISTORY_COLLECTION, INVITATION_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::model::{
    Application, Collaboration, CollaborationFilter, Collaborator, Essay, HistoryEntry, Invitation,
};
use crate::store::Repository;
use crate::types::Result;

pub struct MongoRepository {
    collaborators: MongoCollection<CollaboratorDoc>,
    applications: MongoCollection<ApplicationDoc>,
    essays: MongoCollection<EssayDoc>,
    collaborations: MongoCollection<CollaborationDoc>,
    history: MongoCollection<HistoryDoc>,
    invitations: MongoCollection<InvitationDoc>,
}

impl MongoRepository {
    /// Open all collections, creating indexes on first use
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collaborators: mongo.collection(COLLABORATOR_COLLECTION).await?,
            applications: mongo.collection(APPLICATION_COLLECTION).await?,
            essays: mongo.collection(ESSAY_COLLECTION).await?,
            collaborations: mongo.collection(COLLABORATION_COLLECTION).await?,
            history: mongo.collection(HISTORY_COLLECTION).await?,
            invitations: mongo.collection(INVITATION_COLLECTION).await?,
        })
    }
}

/// `{_id, student_id}` filter, or None when `id` cannot be a document id
fn owned_filter(owner: &str, id: &str) -> Option<Document> {
    ObjectId::parse_str(id)
        .ok()
        .map(|oid| doc! { "_id": oid, "student_id": owner })
}

fn id_filter(id: &str) -> Option<Document> {
    ObjectId::parse_str(id).ok().map(|oid| doc! { "_id": oid })
}

fn oldest_first() -> Document {
    doc! { "metadata.created_at": 1, "_id": 1 }
}

#[async_trait]
impl Repository for MongoRepository {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> Result<()> {
        self.collaborators
            .insert_one(CollaboratorDoc::from_model(collaborator)?)
            .await
    }

    async fn get_collaborator(&self, owner: &str, id: &str) -> Result<Option<Collaborator>> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(None);
        };
        Ok(self
            .collaborators
            .find_one(filter)
            .await?
            .map(CollaboratorDoc::into_model))
    }

    async fn list_collaborators(&self, owner: &str) -> Result<Vec<Collaborator>> {
        let docs = self
            .collaborators
            .find_sorted(doc! { "student_id": owner }, oldest_first())
            .await?;
        Ok(docs.into_iter().map(CollaboratorDoc::into_model).collect())
    }

    async fn update_collaborator(&self, collaborator: &Collaborator) -> Result<()> {
        if let Some(filter) = owned_filter(&collaborator.student_id, &collaborator.id) {
            self.collaborators
                .replace_one(filter, CollaboratorDoc::from_model(collaborator)?)
                .await?;
        }
        Ok(())
    }

    async fn delete_collaborator(&self, owner: &str, id: &str) -> Result<bool> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(false);
        };
        Ok(self.collaborators.soft_delete(filter).await?.matched_count > 0)
    }

    async fn insert_application(&self, application: &Application) -> Result<()> {
        self.applications
            .insert_one(ApplicationDoc::from_model(application)?)
            .await
    }

    async fn get_application(&self, owner: &str, id: &str) -> Result<Option<Application>> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(None);
        };
        Ok(self
            .applications
            .find_one(filter)
            .await?
            .map(ApplicationDoc::into_model))
    }

    async fn list_applications(&self, owner: &str) -> Result<Vec<Application>> {
        let docs = self
            .applications
            .find_sorted(doc! { "student_id": owner }, oldest_first())
            .await?;
        Ok(docs.into_iter().map(ApplicationDoc::into_model).collect())
    }

    async fn update_application(&self, application: &Application) -> Result<()> {
        if let Some(filter) = owned_filter(&application.student_id, &application.id) {
            self.applications
                .replace_one(filter, ApplicationDoc::from_model(application)?)
                .await?;
        }
        Ok(())
    }

    async fn delete_application(&self, owner: &str, id: &str) -> Result<bool> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(false);
        };
        Ok(self.applications.soft_delete(filter).await?.matched_count > 0)
    }

    async fn insert_essay(&self, essay: &Essay) -> Result<()> {
        self.essays.insert_one(EssayDoc::from_model(essay)?).await
    }

    async fn get_essay(&self, owner: &str, id: &str) -> Result<Option<Essay>> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(None);
        };
        Ok(self.essays.find_one(filter).await?.map(EssayDoc::into_model))
    }

    async fn list_essays(&self, owner: &str, application_id: &str) -> Result<Vec<Essay>> {
        let docs = self
            .essays
            .find_sorted(
                doc! { "student_id": owner, "application_id": application_id },
                oldest_first(),
            )
            .await?;
        Ok(docs.into_iter().map(EssayDoc::into_model).collect())
    }

    async fn update_essay(&self, essay: &Essay) -> Result<()> {
        if let Some(filter) = owned_filter(&essay.student_id, &essay.id) {
            self.essays
                .replace_one(filter, EssayDoc::from_model(essay)?)
                .await?;
        }
        Ok(())
    }

    async fn delete_essay(&self, owner: &str, id: &str) -> Result<bool> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(false);
        };
        Ok(self.essays.soft_delete(filter).await?.matched_count > 0)
    }

    async fn insert_collaboration(&self, collaboration: &Collaboration) -> Result<()> {
        self.collaborations
            .insert_one(CollaborationDoc::from_model(collaboration)?)
            .await
    }

    async fn get_collaboration(&self, owner: &str, id: &str) -> Result<Option<Collaboration>> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(None);
        };
        Ok(self
            .collaborations
            .find_one(filter)
            .await?
            .map(CollaborationDoc::into_model))
    }

    async fn find_collaboration(&self, id: &str) -> Result<Option<Collaboration>> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        Ok(self
            .collaborations
            .find_one(filter)
            .await?
            .map(CollaborationDoc::into_model))
    }

    async fn list_collaborations(
        &self,
        owner: &str,
        filter: &CollaborationFilter,
    ) -> Result<Vec<Collaboration>> {
        let mut query = doc! { "student_id": owner };
        if let Some(application_id) = &filter.application_id {
            query.insert("application_id", application_id.as_str());
        }
        if let Some(collaborator_id) = &filter.collaborator_id {
            query.insert("collaborator_id", collaborator_id.as_str());
        }
        if let Some(status) = filter.status {
            query.insert("status", status.as_str());
        }

        let docs = self.collaborations.find_sorted(query, oldest_first()).await?;
        Ok(docs.into_iter().map(CollaborationDoc::into_model).collect())
    }

    async fn update_collaboration(&self, collaboration: &Collaboration) -> Result<()> {
        if let Some(filter) = owned_filter(&collaboration.student_id, &collaboration.id) {
            self.collaborations
                .replace_one(filter, CollaborationDoc::from_model(collaboration)?)
                .await?;
        }
        Ok(())
    }

    async fn delete_collaboration(&self, owner: &str, id: &str) -> Result<bool> {
        let Some(filter) = owned_filter(owner, id) else {
            return Ok(false);
        };
        Ok(self.collaborations.soft_delete(filter).await?.matched_count > 0)
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.history.insert_one(HistoryDoc::from_model(entry)?).await
    }

    async fn list_history(&self, collaboration_id: &str) -> Result<Vec<HistoryEntry>> {
        // ObjectIds grow monotonically within a process, so `_id` keeps
        // insertion order for entries sharing a timestamp.
        let docs = self
            .history
            .find_sorted(doc! { "collaboration_id": collaboration_id }, oldest_first())
            .await?;
        Ok(docs.into_iter().map(HistoryDoc::into_model).collect())
    }

    async fn get_invitation(&self, collaboration_id: &str) -> Result<Option<Invitation>> {
        Ok(self
            .invitations
            .find_one(doc! { "collaboration_id": collaboration_id })
            .await?
            .map(InvitationDoc::into_model))
    }

    async fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>> {
        Ok(self
            .invitations
            .find_one(doc! { "token_hash": token_hash })
            .await?
            .map(InvitationDoc::into_model))
    }

    async fn save_invitation(&self, invitation: &Invitation) -> Result<()> {
        self.invitations
            .upsert_one(
                doc! { "collaboration_id": invitation.collaboration_id.as_str() },
                InvitationDoc::from_model(invitation),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_ids_yield_no_filter() {
        assert!(owned_filter("s1", "not-an-object-id").is_none());
        assert!(id_filter("").is_none());

        let id = crate::model::new_id();
        let filter = owned_filter("s1", &id).unwrap();
        assert_eq!(filter.get_str("student_id").unwrap(), "s1");
        assert_eq!(filter.get_object_id("_id").unwrap().to_hex(), id);
    }
}
