//! Collaboration payload validation
//!
//! Raw request payloads are turned into a [`ValidatedCollaboration`] before
//! anything is written. The type-specific fields travel as a
//! [`CollaborationKind`], so a recommendation without a due date or an
//! essay review without an essay cannot be represented at all.
//!
//! Rules:
//! - recommendations need `nextActionDueDate`; on update this is checked
//!   against the merged record, so an explicit `null` fails
//! - essay reviews need `essayId`
//! - `completed` forces `awaitingActionFrom` to `null`
//!
//! Any status may follow any other.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::str::FromStr;

use crate::lifecycle::{ActionParty, CollaborationStatus, CollaborationType};
use crate::model::{new_id, present, Collaboration};
use crate::types::{Result, TrackerError};
use crate::util::{clean_optional, parse_date_field};

/// Body of `POST /api/collaborations`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollaborationRequest {
    pub collaborator_id: Option<String>,
    pub application_id: Option<String>,
    pub essay_id: Option<String>,
    pub collaboration_type: Option<String>,
    pub status: Option<String>,
    pub awaiting_action_from: Option<String>,
    pub next_action_due_date: Option<String>,
    pub notes: Option<String>,
    pub portal_url: Option<String>,
}

/// Body of `PATCH /api/collaborations/:id`.
///
/// Absent keys keep the stored value, `null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationPatch {
    pub collaboration_type: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub essay_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub awaiting_action_from: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub next_action_due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub portal_url: Option<Option<String>>,
}

/// Type-specific collaboration fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaborationKind {
    Recommendation {
        due_date: NaiveDate,
        portal_url: Option<String>,
    },
    EssayReview {
        essay_id: String,
        due_date: Option<NaiveDate>,
    },
    Guidance {
        due_date: Option<NaiveDate>,
        essay_id: Option<String>,
    },
}

impl CollaborationKind {
    pub fn collaboration_type(&self) -> CollaborationType {
        match self {
            Self::Recommendation { .. } => CollaborationType::Recommendation,
            Self::EssayReview { .. } => CollaborationType::EssayReview,
            Self::Guidance { .. } => CollaborationType::Guidance,
        }
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Recommendation { due_date, .. } => Some(*due_date),
            Self::EssayReview { due_date, .. } | Self::Guidance { due_date, .. } => *due_date,
        }
    }

    pub fn essay_id(&self) -> Option<&str> {
        match self {
            Self::EssayReview { essay_id, .. } => Some(essay_id),
            Self::Guidance { essay_id, .. } => essay_id.as_deref(),
            Self::Recommendation { .. } => None,
        }
    }

    pub fn portal_url(&self) -> Option<&str> {
        match self {
            Self::Recommendation { portal_url, .. } => portal_url.as_deref(),
            _ => None,
        }
    }
}

/// A collaboration payload that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollaboration {
    pub kind: CollaborationKind,
    pub status: CollaborationStatus,
    pub awaiting_action_from: Option<ActionParty>,
    pub notes: Option<String>,
}

impl ValidatedCollaboration {
    /// Build a new record for `student_id`
    pub fn into_record(
        self,
        student_id: &str,
        collaborator_id: &str,
        application_id: &str,
    ) -> Collaboration {
        let now = Utc::now();
        Collaboration {
            id: new_id(),
            student_id: student_id.to_string(),
            collaborator_id: collaborator_id.to_string(),
            application_id: application_id.to_string(),
            essay_id: self.kind.essay_id().map(str::to_string),
            collaboration_type: self.kind.collaboration_type(),
            status: self.status,
            awaiting_action_from: self.awaiting_action_from,
            next_action_due_date: self.kind.due_date(),
            notes: self.notes,
            portal_url: self.kind.portal_url().map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the mutable fields of an existing record
    pub fn apply_to(self, record: &mut Collaboration) {
        record.essay_id = self.kind.essay_id().map(str::to_string);
        record.collaboration_type = self.kind.collaboration_type();
        record.next_action_due_date = self.kind.due_date();
        record.portal_url = self.kind.portal_url().map(str::to_string);
        record.status = self.status;
        record.awaiting_action_from = self.awaiting_action_from;
        record.notes = self.notes;
        record.updated_at = Utc::now();
    }
}

/// Loose field values before the type-specific rules run
struct Draft {
    collaboration_type: CollaborationType,
    status: CollaborationStatus,
    awaiting_action_from: Option<ActionParty>,
    essay_id: Option<String>,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
    portal_url: Option<String>,
}

impl Draft {
    fn finish(self) -> Result<ValidatedCollaboration> {
        let kind = match self.collaboration_type {
            CollaborationType::Recommendation => CollaborationKind::Recommendation {
                due_date: self.due_date.ok_or_else(|| {
                    TrackerError::validation(
                        "nextActionDueDate",
                        "nextActionDueDate is required for recommendations",
                    )
                })?,
                portal_url: self.portal_url,
            },
            CollaborationType::EssayReview => CollaborationKind::EssayReview {
                essay_id: self.essay_id.ok_or_else(|| {
                    TrackerError::validation("essayId", "essayId is required for essay reviews")
                })?,
                due_date: self.due_date,
            },
            CollaborationType::Guidance => CollaborationKind::Guidance {
                due_date: self.due_date,
                essay_id: self.essay_id,
            },
        };

        let awaiting_action_from = if self.status == CollaborationStatus::Completed {
            None
        } else {
            self.awaiting_action_from
        };

        Ok(ValidatedCollaboration {
            kind,
            status: self.status,
            awaiting_action_from,
            notes: self.notes,
        })
    }
}

/// Validate a create payload
pub fn validate_new(req: &NewCollaborationRequest) -> Result<ValidatedCollaboration> {
    let collaboration_type = match req.collaboration_type.as_deref() {
        Some(value) => parse_enum("collaborationType", value)?,
        None => return Err(TrackerError::missing("collaborationType")),
    };

    Draft {
        collaboration_type,
        status: req
            .status
            .as_deref()
            .map(|s| parse_enum("status", s))
            .transpose()?
            .unwrap_or_default(),
        awaiting_action_from: req
            .awaiting_action_from
            .as_deref()
            .map(|s| parse_enum("awaitingActionFrom", s))
            .transpose()?,
        essay_id: clean_id(req.essay_id.as_deref()),
        due_date: parse_due_date(req.next_action_due_date.as_deref())?,
        notes: clean_optional(req.notes.as_deref()),
        portal_url: clean_optional(req.portal_url.as_deref()),
    }
    .finish()
}

/// Validate a patch against the stored record it will be merged into
pub fn validate_patch(
    existing: &Collaboration,
    patch: &CollaborationPatch,
) -> Result<ValidatedCollaboration> {
    let collaboration_type = match patch.collaboration_type.as_deref() {
        Some(value) => parse_enum("collaborationType", value)?,
        None => existing.collaboration_type,
    };
    let status = match patch.status.as_deref() {
        Some(value) => parse_enum("status", value)?,
        None => existing.status,
    };
    let awaiting_action_from = match &patch.awaiting_action_from {
        None => existing.awaiting_action_from,
        Some(value) => value
            .as_deref()
            .map(|s| parse_enum("awaitingActionFrom", s))
            .transpose()?,
    };
    let due_date = match &patch.next_action_due_date {
        None => existing.next_action_due_date,
        Some(value) => parse_due_date(value.as_deref())?,
    };

    Draft {
        collaboration_type,
        status,
        awaiting_action_from,
        essay_id: merge(&patch.essay_id, &existing.essay_id, clean_id),
        due_date,
        notes: merge(&patch.notes, &existing.notes, clean_optional),
        portal_url: merge(&patch.portal_url, &existing.portal_url, clean_optional),
    }
    .finish()
}

fn merge(
    patch: &Option<Option<String>>,
    stored: &Option<String>,
    clean: fn(Option<&str>) -> Option<String>,
) -> Option<String> {
    match patch {
        None => stored.clone(),
        Some(value) => clean(value.as_deref()),
    }
}

fn parse_enum<T>(field: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    value
        .trim()
        .parse()
        .map_err(|message: String| TrackerError::validation(field, message))
}

/// Blank counts as absent
fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date_field("nextActionDueDate", v).map(Some),
    }
}

fn clean_id(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(due: Option<&str>) -> NewCollaborationRequest {
        NewCollaborationRequest {
            collaborator_id: Some("c1".into()),
            application_id: Some("a1".into()),
            collaboration_type: Some("recommendation".into()),
            next_action_due_date: due.map(str::to_string),
            ..Default::default()
        }
    }

    fn stored(req: &NewCollaborationRequest) -> Collaboration {
        validate_new(req).unwrap().into_record("s1", "c1", "a1")
    }

    fn patch(json: &str) -> CollaborationPatch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_recommendation_requires_due_date() {
        let err = validate_new(&recommendation(None)).unwrap_err();
        assert_eq!(err.field(), Some("nextActionDueDate"));

        let ok = validate_new(&recommendation(Some("2025-12-01"))).unwrap();
        assert_eq!(ok.status, CollaborationStatus::Pending);
        assert_eq!(
            ok.kind.due_date(),
            NaiveDate::from_ymd_opt(2025, 12, 1)
        );
    }

    #[test]
    fn test_blank_due_date_counts_as_missing() {
        let err = validate_new(&recommendation(Some("  "))).unwrap_err();
        assert_eq!(err.field(), Some("nextActionDueDate"));
    }

    #[test]
    fn test_unparsable_due_date_rejected() {
        let err = validate_new(&recommendation(Some("someday"))).unwrap_err();
        assert_eq!(err.field(), Some("nextActionDueDate"));
    }

    #[test]
    fn test_essay_review_requires_essay() {
        let mut req = NewCollaborationRequest {
            collaboration_type: Some("essayReview".into()),
            ..Default::default()
        };
        assert_eq!(validate_new(&req).unwrap_err().field(), Some("essayId"));

        req.essay_id = Some("e1".into());
        let ok = validate_new(&req).unwrap();
        assert_eq!(ok.kind.essay_id(), Some("e1"));
        assert_eq!(ok.kind.due_date(), None);
    }

    #[test]
    fn test_unknown_enum_values_name_their_field() {
        let mut req = recommendation(Some("2025-12-01"));
        req.status = Some("archived".into());
        assert_eq!(validate_new(&req).unwrap_err().field(), Some("status"));

        let mut req = recommendation(Some("2025-12-01"));
        req.awaiting_action_from = Some("parent".into());
        assert_eq!(
            validate_new(&req).unwrap_err().field(),
            Some("awaitingActionFrom")
        );

        let mut req = recommendation(Some("2025-12-01"));
        req.collaboration_type = Some("reference".into());
        assert_eq!(
            validate_new(&req).unwrap_err().field(),
            Some("collaborationType")
        );

        let mut req = recommendation(Some("2025-12-01"));
        req.collaboration_type = None;
        assert_eq!(
            validate_new(&req).unwrap_err().field(),
            Some("collaborationType")
        );
    }

    #[test]
    fn test_completed_clears_awaiting_party() {
        let mut req = recommendation(Some("2025-12-01"));
        req.status = Some("completed".into());
        req.awaiting_action_from = Some("collaborator".into());
        let ok = validate_new(&req).unwrap();
        assert_eq!(ok.awaiting_action_from, None);
    }

    #[test]
    fn test_patch_merges_with_stored_due_date() {
        let mut record = stored(&recommendation(Some("2025-12-01")));
        record.awaiting_action_from = Some(ActionParty::Collaborator);

        let ok = validate_patch(&record, &patch(r#"{"status": "completed"}"#)).unwrap();
        assert_eq!(ok.status, CollaborationStatus::Completed);
        assert_eq!(ok.awaiting_action_from, None);
        assert_eq!(ok.kind.due_date(), record.next_action_due_date);
    }

    #[test]
    fn test_patch_nulling_recommendation_due_date_fails() {
        let record = stored(&recommendation(Some("2025-12-01")));
        let err = validate_patch(&record, &patch(r#"{"nextActionDueDate": null}"#)).unwrap_err();
        assert_eq!(err.field(), Some("nextActionDueDate"));
    }

    #[test]
    fn test_switching_to_recommendation_needs_due_date() {
        let guidance = stored(&NewCollaborationRequest {
            collaboration_type: Some("guidance".into()),
            ..Default::default()
        });

        let err = validate_patch(&guidance, &patch(r#"{"collaborationType": "recommendation"}"#))
            .unwrap_err();
        assert_eq!(err.field(), Some("nextActionDueDate"));

        let ok = validate_patch(
            &guidance,
            &patch(r#"{"collaborationType": "recommendation", "nextActionDueDate": "2026-01-10"}"#),
        )
        .unwrap();
        assert_eq!(ok.kind.collaboration_type(), CollaborationType::Recommendation);
    }

    #[test]
    fn test_fields_outside_the_type_are_dropped() {
        let req = NewCollaborationRequest {
            collaboration_type: Some("guidance".into()),
            portal_url: Some("https://portal.example.org".into()),
            ..Default::default()
        };
        let record = stored(&req);
        assert_eq!(record.portal_url, None);

        let mut rec = recommendation(Some("2025-12-01"));
        rec.essay_id = Some("e1".into());
        rec.portal_url = Some("https://portal.example.org".into());
        let record = stored(&rec);
        assert_eq!(record.essay_id, None);
        assert_eq!(record.portal_url.as_deref(), Some("https://portal.example.org"));
    }

    #[test]
    fn test_patch_absent_keeps_null_clears() {
        let mut req = recommendation(Some("2025-12-01"));
        req.notes = Some("<b>Call</b> after lunch".into());
        let record = stored(&req);
        assert_eq!(record.notes.as_deref(), Some("Call after lunch"));

        let kept = validate_patch(&record, &patch("{}")).unwrap();
        assert_eq!(kept.notes.as_deref(), Some("Call after lunch"));

        let cleared = validate_patch(&record, &patch(r#"{"notes": null}"#)).unwrap();
        assert_eq!(cleared.notes, None);
    }
}
