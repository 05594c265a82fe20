//! Storage port
//!
//! Handlers and lifecycle services talk to a [`Repository`] so the backing
//! store can be swapped: MongoDB in production, an in-memory map in dev mode
//! and tests.
//!
//! Every student-owned lookup takes the owner id; a record owned by someone
//! else is indistinguishable from a missing one. Updates replace the whole
//! record and the last write wins.

pub mod memory;
pub mod mongo;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;

use async_trait::async_trait;

use crate::model::{
    Application, Collaboration, CollaborationFilter, Collaborator, Essay, HistoryEntry, Invitation,
};
use crate::types::Result;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    // Collaborators
    async fn insert_collaborator(&self, collaborator: &Collaborator) -> Result<()>;
    async fn get_collaborator(&self, owner: &str, id: &str) -> Result<Option<Collaborator>>;
    async fn list_collaborators(&self, owner: &str) -> Result<Vec<Collaborator>>;
    async fn update_collaborator(&self, collaborator: &Collaborator) -> Result<()>;
    async fn delete_collaborator(&self, owner: &str, id: &str) -> Result<bool>;

    // Applications
    async fn insert_application(&self, application: &Application) -> Result<()>;
    async fn get_application(&self, owner: &str, id: &str) -> Result<Option<Application>>;
    async fn list_applications(&self, owner: &str) -> Result<Vec<Application>>;
    async fn update_application(&self, application: &Application) -> Result<()>;
    async fn delete_application(&self, owner: &str, id: &str) -> Result<bool>;

    // Essays
    async fn insert_essay(&self, essay: &Essay) -> Result<()>;
    async fn get_essay(&self, owner: &str, id: &str) -> Result<Option<Essay>>;
    async fn list_essays(&self, owner: &str, application_id: &str) -> Result<Vec<Essay>>;
    async fn update_essay(&self, essay: &Essay) -> Result<()>;
    async fn delete_essay(&self, owner: &str, id: &str) -> Result<bool>;

    // Collaborations
    async fn insert_collaboration(&self, collaboration: &Collaboration) -> Result<()>;
    async fn get_collaboration(&self, owner: &str, id: &str) -> Result<Option<Collaboration>>;
    /// Unscoped lookup for invite-token flows, where the caller is the collaborator
    async fn find_collaboration(&self, id: &str) -> Result<Option<Collaboration>>;
    async fn list_collaborations(
        &self,
        owner: &str,
        filter: &CollaborationFilter,
    ) -> Result<Vec<Collaboration>>;
    async fn update_collaboration(&self, collaboration: &Collaboration) -> Result<()>;
    async fn delete_collaboration(&self, owner: &str, id: &str) -> Result<bool>;

    // History (append-only)
    async fn append_history(&self, entry: &HistoryEntry) -> Result<()>;
    /// All entries for one collaboration, oldest first, ties in insertion order
    async fn list_history(&self, collaboration_id: &str) -> Result<Vec<HistoryEntry>>;

    // Invitations
    async fn get_invitation(&self, collaboration_id: &str) -> Result<Option<Invitation>>;
    async fn find_invitation_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>>;
    async fn save_invitation(&self, invitation: &Invitation) -> Result<()>;
}
