//! Collaboration enums: type, status, waiting party and history actions
//!
//! Wire names match what the frontend already stores: `essayReview` is
//! camelCase while statuses and history actions are snake_case.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the collaborator is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollaborationType {
    Recommendation,
    EssayReview,
    Guidance,
}

impl CollaborationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recommendation => "recommendation",
            Self::EssayReview => "essayReview",
            Self::Guidance => "guidance",
        }
    }
}

impl FromStr for CollaborationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recommendation" => Ok(Self::Recommendation),
            "essayReview" | "essay_review" => Ok(Self::EssayReview),
            "guidance" => Ok(Self::Guidance),
            other => Err(format!(
                "unknown collaboration type '{other}' (expected recommendation, essayReview or guidance)"
            )),
        }
    }
}

impl fmt::Display for CollaborationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collaboration status.
///
/// There is no transition graph: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationStatus {
    #[default]
    Pending,
    Invited,
    InProgress,
    Submitted,
    Completed,
    Declined,
}

impl CollaborationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Invited => "invited",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Declined => "declined",
        }
    }

    /// History action recorded when a collaboration moves into this status
    pub fn history_action(&self) -> HistoryAction {
        match self {
            Self::Pending => HistoryAction::StatusChanged,
            Self::Invited => HistoryAction::Invited,
            Self::InProgress => HistoryAction::InProgress,
            Self::Submitted => HistoryAction::Submitted,
            Self::Completed => HistoryAction::Completed,
            Self::Declined => HistoryAction::Declined,
        }
    }
}

impl FromStr for CollaborationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "invited" => Ok(Self::Invited),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "completed" => Ok(Self::Completed),
            "declined" => Ok(Self::Declined),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

impl fmt::Display for CollaborationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the next step is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionParty {
    Student,
    Collaborator,
}

impl ActionParty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Collaborator => "collaborator",
        }
    }
}

impl FromStr for ActionParty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "collaborator" => Ok(Self::Collaborator),
            other => Err(format!("unknown party '{other}' (expected student or collaborator)")),
        }
    }
}

/// Machine-readable code of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Invited,
    ReminderSent,
    Viewed,
    Accepted,
    Declined,
    InProgress,
    Submitted,
    Completed,
    CommentAdded,
    StatusChanged,
    DueDateChanged,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::ReminderSent => "reminder_sent",
            Self::Viewed => "viewed",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::CommentAdded => "comment_added",
            Self::StatusChanged => "status_changed",
            Self::DueDateChanged => "due_date_changed",
        }
    }

    /// Actions a student may log by hand
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::CommentAdded | Self::ReminderSent | Self::Viewed)
    }
}

impl FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invited" => Ok(Self::Invited),
            "reminder_sent" => Ok(Self::ReminderSent),
            "viewed" => Ok(Self::Viewed),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "completed" => Ok(Self::Completed),
            "comment_added" => Ok(Self::CommentAdded),
            "status_changed" => Ok(Self::StatusChanged),
            "due_date_changed" => Ok(Self::DueDateChanged),
            other => Err(format!("unknown history action '{other}'")),
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        assert_eq!(
            serde_json::to_string(&CollaborationStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&CollaborationType::EssayReview).unwrap(),
            "\"essayReview\""
        );
        assert_eq!(
            serde_json::to_string(&HistoryAction::ReminderSent).unwrap(),
            "\"reminder_sent\""
        );
        for status in [
            CollaborationStatus::Pending,
            CollaborationStatus::Invited,
            CollaborationStatus::InProgress,
            CollaborationStatus::Submitted,
            CollaborationStatus::Completed,
            CollaborationStatus::Declined,
        ] {
            assert_eq!(status.as_str().parse::<CollaborationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert!("archived".parse::<CollaborationStatus>().is_err());
        assert!("reference".parse::<CollaborationType>().is_err());
        assert!("counselor".parse::<ActionParty>().is_err());
    }

    #[test]
    fn test_status_history_actions() {
        assert_eq!(
            CollaborationStatus::Completed.history_action(),
            HistoryAction::Completed
        );
        assert_eq!(
            CollaborationStatus::Pending.history_action(),
            HistoryAction::StatusChanged
        );
    }

    #[test]
    fn test_manual_actions() {
        assert!(HistoryAction::CommentAdded.is_manual());
        assert!(!HistoryAction::Completed.is_manual());
        assert!(!HistoryAction::Invited.is_manual());
    }
}
