//! Collaboration history log
//!
//! Append-only. Entries are never edited or removed, and the only query is
//! the full timeline of one collaboration, oldest first.

use std::sync::Arc;
use tracing::debug;

use crate::lifecycle::HistoryAction;
use crate::model::{Collaboration, HistoryEntry};
use crate::store::Repository;
use crate::types::Result;
use crate::util::{format_display, strip_html};

#[derive(Clone)]
pub struct HistoryLog {
    repo: Arc<dyn Repository>,
}

impl HistoryLog {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Append one entry; markup is stripped from `details`
    pub async fn append(
        &self,
        collaboration_id: &str,
        action: HistoryAction,
        details: &str,
    ) -> Result<HistoryEntry> {
        let entry = HistoryEntry::new(collaboration_id, action, strip_html(details).trim());
        self.repo.append_history(&entry).await?;
        debug!(
            collaboration_id = %collaboration_id,
            action = %action,
            "History entry appended"
        );
        Ok(entry)
    }

    /// Append entries in order
    pub async fn append_all(&self, entries: &[HistoryEntry]) -> Result<()> {
        for entry in entries {
            self.repo.append_history(entry).await?;
            debug!(
                collaboration_id = %entry.collaboration_id,
                action = %entry.action,
                "History entry appended"
            );
        }
        Ok(())
    }

    pub async fn list(&self, collaboration_id: &str) -> Result<Vec<HistoryEntry>> {
        self.repo.list_history(collaboration_id).await
    }
}

/// Entries describing what an update changed: one per changed aspect
pub fn changes(before: &Collaboration, after: &Collaboration) -> Vec<HistoryEntry> {
    let mut entries = Vec::new();
    let id = after.id.as_str();

    if before.status != after.status {
        entries.push(HistoryEntry::new(
            id,
            after.status.history_action(),
            format!("Status changed from {} to {}", before.status, after.status),
        ));
    }

    if before.notes != after.notes {
        let details = match &after.notes {
            Some(notes) => notes.clone(),
            None => "Notes cleared".to_string(),
        };
        entries.push(HistoryEntry::new(id, HistoryAction::CommentAdded, details));
    }

    if before.next_action_due_date != after.next_action_due_date {
        let details = match (before.next_action_due_date, after.next_action_due_date) {
            (Some(old), Some(new)) => format!(
                "Due date changed from {} to {}",
                format_display(old),
                format_display(new)
            ),
            (None, Some(new)) => format!("Due date set to {}", format_display(new)),
            _ => "Due date removed".to_string(),
        };
        entries.push(HistoryEntry::new(id, HistoryAction::DueDateChanged, details));
    }

    entries
}
