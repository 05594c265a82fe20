//! Collaboration service
//!
//! Create, update and delete collaborations with ownership checks on every
//! referenced record, and write the matching history entries.

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::lifecycle::history::{self, HistoryLog};
use crate::lifecycle::{
    validate_new, validate_patch, CollaborationPatch, HistoryAction, NewCollaborationRequest,
};
use crate::model::{Collaboration, CollaborationFilter, HistoryEntry};
use crate::store::Repository;
use crate::types::{Result, TrackerError};

/// Body of `POST /api/collaborations/:id/history`
#[derive(Debug, Default, Deserialize)]
pub struct ManualHistoryRequest {
    pub action: Option<String>,
    pub details: Option<String>,
}

#[derive(Clone)]
pub struct CollaborationService {
    repo: Arc<dyn Repository>,
    history: HistoryLog,
}

impl CollaborationService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            history: HistoryLog::new(repo.clone()),
            repo,
        }
    }

    pub async fn create(
        &self,
        student_id: &str,
        req: NewCollaborationRequest,
    ) -> Result<Collaboration> {
        let validated = validate_new(&req)?;

        let collaborator_id = required_ref(req.collaborator_id.as_deref(), "collaboratorId")?;
        let application_id = required_ref(req.application_id.as_deref(), "applicationId")?;

        self.repo
            .get_collaborator(student_id, collaborator_id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Collaborator not found"))?;
        self.repo
            .get_application(student_id, application_id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Application not found"))?;
        if let Some(essay_id) = validated.kind.essay_id() {
            self.check_essay(student_id, application_id, essay_id).await?;
        }

        let collaboration = validated.into_record(student_id, collaborator_id, application_id);
        self.repo.insert_collaboration(&collaboration).await?;

        info!(
            collaboration_id = %collaboration.id,
            collaboration_type = %collaboration.collaboration_type,
            "Collaboration created"
        );
        Ok(collaboration)
    }

    pub async fn get(&self, student_id: &str, id: &str) -> Result<Collaboration> {
        self.repo
            .get_collaboration(student_id, id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Collaboration not found"))
    }

    pub async fn list(
        &self,
        student_id: &str,
        filter: &CollaborationFilter,
    ) -> Result<Vec<Collaboration>> {
        self.repo.list_collaborations(student_id, filter).await
    }

    /// Merge a patch, re-validate and record one history entry per change
    pub async fn update(
        &self,
        student_id: &str,
        id: &str,
        patch: CollaborationPatch,
    ) -> Result<Collaboration> {
        let before = self.get(student_id, id).await?;
        let validated = validate_patch(&before, &patch)?;

        if let Some(essay_id) = validated.kind.essay_id() {
            if before.essay_id.as_deref() != Some(essay_id) {
                self.check_essay(student_id, &before.application_id, essay_id)
                    .await?;
            }
        }

        let mut after = before.clone();
        validated.apply_to(&mut after);
        self.repo.update_collaboration(&after).await?;

        let entries = history::changes(&before, &after);
        self.history.append_all(&entries).await?;

        info!(
            collaboration_id = %after.id,
            status = %after.status,
            changes = entries.len(),
            "Collaboration updated"
        );
        Ok(after)
    }

    pub async fn delete(&self, student_id: &str, id: &str) -> Result<()> {
        if !self.repo.delete_collaboration(student_id, id).await? {
            return Err(TrackerError::not_found("Collaboration not found"));
        }
        info!(collaboration_id = %id, "Collaboration deleted");
        Ok(())
    }

    /// Full timeline, oldest first
    pub async fn history(&self, student_id: &str, id: &str) -> Result<Vec<HistoryEntry>> {
        let collaboration = self.get(student_id, id).await?;
        self.history.list(&collaboration.id).await
    }

    /// A student-logged entry such as a phone call or a reminder they sent themselves
    pub async fn add_history(
        &self,
        student_id: &str,
        id: &str,
        req: ManualHistoryRequest,
    ) -> Result<HistoryEntry> {
        let collaboration = self.get(student_id, id).await?;

        let action: HistoryAction = match req.action.as_deref().map(str::trim) {
            None | Some("") => return Err(TrackerError::missing("action")),
            Some(value) => value
                .parse()
                .map_err(|message: String| TrackerError::validation("action", message))?,
        };
        if !action.is_manual() {
            return Err(TrackerError::validation(
                "action",
                format!("'{action}' entries are recorded automatically"),
            ));
        }

        let details = req
            .details
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| TrackerError::missing("details"))?;

        self.history.append(&collaboration.id, action, details).await
    }

    async fn check_essay(
        &self,
        student_id: &str,
        application_id: &str,
        essay_id: &str,
    ) -> Result<()> {
        let essay = self
            .repo
            .get_essay(student_id, essay_id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Essay not found"))?;
        if essay.application_id != application_id {
            return Err(TrackerError::validation(
                "essayId",
                "Essay belongs to a different application",
            ));
        }
        Ok(())
    }
}

fn required_ref<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TrackerError::missing(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ActionParty, CollaborationStatus};
    use crate::model::{Application, Collaborator, Essay, NewApplication, NewCollaborator, NewEssay};
    use crate::store::MemoryRepository;

    struct Fixture {
        service: CollaborationService,
        collaborator_id: String,
        application_id: String,
        essay: Essay,
        other_essay: Essay,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());

        let collaborator = Collaborator::create(
            "s1",
            NewCollaborator {
                name: Some("Ms. Lee".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.insert_collaborator(&collaborator).await.unwrap();

        let mut apps = Vec::new();
        for name in ["Merit Award", "STEM Grant"] {
            let app = Application::create(
                "s1",
                NewApplication {
                    scholarship_name: Some(name.into()),
                    ..Default::default()
                },
            )
            .unwrap();
            repo.insert_application(&app).await.unwrap();
            apps.push(app);
        }

        let essay = Essay::create(
            "s1",
            &apps[0].id,
            NewEssay {
                title: Some("Why me".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.insert_essay(&essay).await.unwrap();

        let other_essay = Essay::create(
            "s1",
            &apps[1].id,
            NewEssay {
                title: Some("Research".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.insert_essay(&other_essay).await.unwrap();

        Fixture {
            service: CollaborationService::new(repo),
            collaborator_id: collaborator.id,
            application_id: apps[0].id.clone(),
            essay,
            other_essay,
        }
    }

    fn request(f: &Fixture, kind: &str) -> NewCollaborationRequest {
        NewCollaborationRequest {
            collaborator_id: Some(f.collaborator_id.clone()),
            application_id: Some(f.application_id.clone()),
            collaboration_type: Some(kind.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_checks_references() {
        let f = fixture().await;

        let mut req = request(&f, "guidance");
        req.collaborator_id = Some(crate::model::new_id());
        let err = f.service.create("s1", req).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        let err = f.service.create("s2", request(&f, "guidance")).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        let mut req = request(&f, "guidance");
        req.application_id = None;
        assert_eq!(
            f.service.create("s1", req).await.unwrap_err().field(),
            Some("applicationId")
        );

        let created = f.service.create("s1", request(&f, "guidance")).await.unwrap();
        assert_eq!(created.status, CollaborationStatus::Pending);
        assert_eq!(created.awaiting_action_from, None);
    }

    #[tokio::test]
    async fn test_essay_must_belong_to_application() {
        let f = fixture().await;

        let mut req = request(&f, "essayReview");
        req.essay_id = Some(f.other_essay.id.clone());
        assert_eq!(
            f.service.create("s1", req).await.unwrap_err().field(),
            Some("essayId")
        );

        let mut req = request(&f, "essayReview");
        req.essay_id = Some(f.essay.id.clone());
        let created = f.service.create("s1", req).await.unwrap();
        assert_eq!(created.essay_id.as_deref(), Some(f.essay.id.as_str()));
    }

    #[tokio::test]
    async fn test_update_appends_history_per_change() {
        let f = fixture().await;
        let mut req = request(&f, "recommendation");
        req.next_action_due_date = Some("2025-12-01".into());
        req.awaiting_action_from = Some("collaborator".into());
        let created = f.service.create("s1", req).await.unwrap();

        let patch: CollaborationPatch =
            serde_json::from_str(r#"{"status": "completed", "notes": "Letter in portal"}"#)
                .unwrap();
        let updated = f.service.update("s1", &created.id, patch).await.unwrap();
        assert_eq!(updated.status, CollaborationStatus::Completed);
        assert_eq!(updated.awaiting_action_from, None);

        let history = f.service.history("s1", &created.id).await.unwrap();
        let actions: Vec<_> = history.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![HistoryAction::Completed, HistoryAction::CommentAdded]);

        let stored = f.service.get("s1", &created.id).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() {
        let f = fixture().await;
        let mut req = request(&f, "recommendation");
        req.next_action_due_date = Some("2025-12-01".into());
        req.awaiting_action_from = Some("student".into());
        let created = f.service.create("s1", req).await.unwrap();

        let patch: CollaborationPatch =
            serde_json::from_str(r#"{"status": "submitted", "nextActionDueDate": null}"#).unwrap();
        assert!(f.service.update("s1", &created.id, patch).await.is_err());

        let stored = f.service.get("s1", &created.id).await.unwrap();
        assert_eq!(stored.status, CollaborationStatus::Pending);
        assert_eq!(stored.awaiting_action_from, Some(ActionParty::Student));
        assert!(f.service.history("s1", &created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_history_rules() {
        let f = fixture().await;
        let created = f.service.create("s1", request(&f, "guidance")).await.unwrap();

        let err = f
            .service
            .add_history(
                "s1",
                &created.id,
                ManualHistoryRequest {
                    action: Some("completed".into()),
                    details: Some("done".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("action"));

        let err = f
            .service
            .add_history(
                "s1",
                &created.id,
                ManualHistoryRequest {
                    action: Some("comment_added".into()),
                    details: Some("   ".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("details"));

        let entry = f
            .service
            .add_history(
                "s1",
                &created.id,
                ManualHistoryRequest {
                    action: Some("reminder_sent".into()),
                    details: Some("Texted a reminder".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(entry.action, HistoryAction::ReminderSent);
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let f = fixture().await;
        let created = f.service.create("s1", request(&f, "guidance")).await.unwrap();

        assert!(f.service.delete("s2", &created.id).await.is_err());
        f.service.delete("s1", &created.id).await.unwrap();
        assert!(f.service.get("s1", &created.id).await.is_err());
    }
}
