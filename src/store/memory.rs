//! In-memory repository
//!
//! Used in dev mode when MongoDB is unavailable, and by the test suites.
//! Nothing survives a restart.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::{
    Application, Collaboration, CollaborationFilter, Collaborator, Essay, HistoryEntry, Invitation,
};
use crate::store::Repository;
use crate::types::Result;

#[derive(Default)]
pub struct MemoryRepository {
    collaborators: DashMap<String, Collaborator>,
    applications: DashMap<String, Application>,
    essays: DashMap<String, Essay>,
    collaborations: DashMap<String, Collaboration>,
    /// collaboration id -> entries in insertion order
    history: DashMap<String, Vec<HistoryEntry>>,
    /// collaboration id -> invitation
    invitations: DashMap<String, Invitation>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned<T: Clone>(
    map: &DashMap<String, T>,
    id: &str,
    owner: &str,
    owner_of: impl Fn(&T) -> &str,
) -> Option<T> {
    map.get(id)
        .filter(|entry| owner_of(entry.value()) == owner)
        .map(|entry| entry.value().clone())
}

fn remove_owned<T>(
    map: &DashMap<String, T>,
    id: &str,
    owner: &str,
    owner_of: impl Fn(&T) -> &str,
) -> bool {
    map.remove_if(id, |_, v| owner_of(v) == owner).is_some()
}

/// Oldest first; the id breaks ties so listings are stable
fn sorted<T: Clone>(
    map: &DashMap<String, T>,
    keep: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, String),
) -> Vec<T> {
    let mut items: Vec<T> = map
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect();
    items.sort_by_key(|item| key(item));
    items
}

/// Replace an existing record in place; a missing record stays missing
fn replace<T: Clone>(map: &DashMap<String, T>, id: &str, value: &T) {
    if let Some(mut entry) = map.get_mut(id) {
        *entry = value.clone();
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_collaborator(&self, collaborator: &Collaborator) -> Result<()> {
        self.collaborators
            .insert(collaborator.id.clone(), collaborator.clone());
        Ok(())
    }

    async fn get_collaborator(&self, owner: &str, id: &str) -> Result<Option<Collaborator>> {
        Ok(owned(&self.collaborators, id, owner, |c| c.student_id.as_str()))
    }

    async fn list_collaborators(&self, owner: &str) -> Result<Vec<Collaborator>> {
        Ok(sorted(
            &self.collaborators,
            |c| c.student_id == owner,
            |c| (c.created_at, c.id.clone()),
        ))
    }

    async fn update_collaborator(&self, collaborator: &Collaborator) -> Result<()> {
        replace(&self.collaborators, &collaborator.id, collaborator);
        Ok(())
    }

    async fn delete_collaborator(&self, owner: &str, id: &str) -> Result<bool> {
        Ok(remove_owned(&self.collaborators, id, owner, |c| c.student_id.as_str()))
    }

    async fn insert_application(&self, application: &Application) -> Result<()> {
        self.applications
            .insert(application.id.clone(), application.clone());
        Ok(())
    }

    async fn get_application(&self, owner: &str, id: &str) -> Result<Option<Application>> {
        Ok(owned(&self.applications, id, owner, |a| a.student_id.as_str()))
    }

    async fn list_applications(&self, owner: &str) -> Result<Vec<Application>> {
        Ok(sorted(
            &self.applications,
            |a| a.student_id == owner,
            |a| (a.created_at, a.id.clone()),
        ))
    }

    async fn update_application(&self, application: &Application) -> Result<()> {
        replace(&self.applications, &application.id, application);
        Ok(())
    }

    async fn delete_application(&self, owner: &str, id: &str) -> Result<bool> {
        Ok(remove_owned(&self.applications, id, owner, |a| a.student_id.as_str()))
    }

    async fn insert_essay(&self, essay: &Essay) -> Result<()> {
        self.essays.insert(essay.id.clone(), essay.clone());
        Ok(())
    }

    async fn get_essay(&self, owner: &str, id: &str) -> Result<Option<Essay>> {
        Ok(owned(&self.essays, id, owner, |e| e.student_id.as_str()))
    }

    async fn list_essays(&self, owner: &str, application_id: &str) -> Result<Vec<Essay>> {
        Ok(sorted(
            &self.essays,
            |e| e.student_id == owner && e.application_id == application_id,
            |e| (e.created_at, e.id.clone()),
        ))
    }

    async fn update_essay(&self, essay: &Essay) -> Result<()> {
        replace(&self.essays, &essay.id, essay);
        Ok(())
    }

    async fn delete_essay(&self, owner: &str, id: &str) -> Result<bool> {
        Ok(remove_owned(&self.essays, id, owner, |e| e.student_id.as_str()))
    }

    async fn insert_collaboration(&self, collaboration: &Collaboration) -> Result<()> {
        self.collaborations
            .insert(collaboration.id.clone(), collaboration.clone());
        Ok(())
    }

    async fn get_collaboration(&self, owner: &str, id: &str) -> Result<Option<Collaboration>> {
        Ok(owned(&self.collaborations, id, owner, |c| c.student_id.as_str()))
    }

    async fn find_collaboration(&self, id: &str) -> Result<Option<Collaboration>> {
        Ok(self.collaborations.get(id).map(|c| c.value().clone()))
    }

    async fn list_collaborations(
        &self,
        owner: &str,
        filter: &CollaborationFilter,
    ) -> Result<Vec<Collaboration>> {
        Ok(sorted(
            &self.collaborations,
            |c| c.student_id == owner && filter.matches(c),
            |c| (c.created_at, c.id.clone()),
        ))
    }

    async fn update_collaboration(&self, collaboration: &Collaboration) -> Result<()> {
        replace(&self.collaborations, &collaboration.id, collaboration);
        Ok(())
    }

    async fn delete_collaboration(&self, owner: &str, id: &str) -> Result<bool> {
        Ok(remove_owned(&self.collaborations, id, owner, |c| c.student_id.as_str()))
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.history
            .entry(entry.collaboration_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn list_history(&self, collaboration_id: &str) -> Result<Vec<HistoryEntry>> {
        let mut entries = self
            .history
            .get(collaboration_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn get_invitation(&self, collaboration_id: &str) -> Result<Option<Invitation>> {
        Ok(self
            .invitations
            .get(collaboration_id)
            .map(|i| i.value().clone()))
    }

    async fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>> {
        Ok(self
            .invitations
            .iter()
            .find(|i| i.token_hash.as_deref() == Some(token_hash))
            .map(|i| i.value().clone()))
    }

    async fn save_invitation(&self, invitation: &Invitation) -> Result<()> {
        self.invitations
            .insert(invitation.collaboration_id.clone(), invitation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::HistoryAction;
    use crate::model::{NewApplication, NewCollaborator};

    #[tokio::test]
    async fn test_owner_scoping() {
        let repo = MemoryRepository::new();
        let collaborator = Collaborator::create(
            "alice",
            NewCollaborator {
                name: Some("Mr. Chen".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.insert_collaborator(&collaborator).await.unwrap();

        assert!(repo
            .get_collaborator("alice", &collaborator.id)
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .get_collaborator("bob", &collaborator.id)
            .await
            .unwrap()
            .is_none());
        assert!(repo.list_collaborators("bob").await.unwrap().is_empty());
        assert!(!repo.delete_collaborator("bob", &collaborator.id).await.unwrap());
        assert!(repo.delete_collaborator("alice", &collaborator.id).await.unwrap());
        assert!(repo.list_collaborators("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_record_is_noop() {
        let repo = MemoryRepository::new();
        let app = Application::create(
            "alice",
            NewApplication {
                scholarship_name: Some("Dell Scholars".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.update_application(&app).await.unwrap();
        assert!(repo.list_applications("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_keeps_insertion_order() {
        let repo = MemoryRepository::new();
        let actions = [
            HistoryAction::Invited,
            HistoryAction::Viewed,
            HistoryAction::Accepted,
            HistoryAction::Submitted,
        ];
        for action in actions {
            repo.append_history(&HistoryEntry::new("c1", action, action.as_str()))
                .await
                .unwrap();
        }

        let history = repo.list_history("c1").await.unwrap();
        let listed: Vec<_> = history.iter().map(|e| e.action).collect();
        assert_eq!(listed, actions);
        assert!(repo.list_history("c2").await.unwrap().is_empty());
    }
}
