//! Scholarship applications

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{new_id, present};
use crate::types::{Result, TrackerError};
use crate::util::{clean_optional, is_past, parse_date_field, strip_html};

const DEFAULT_STATUS: &str = "planning";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub student_id: String,
    pub scholarship_name: String,
    pub organization: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<NaiveDate>,
    /// Free text; the frontend decides the vocabulary
    pub status: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application plus read-time derived fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub is_past_deadline: bool,
}

impl ApplicationView {
    pub fn new(application: Application, today: NaiveDate) -> Self {
        let is_past_deadline = application.deadline.is_some_and(|d| is_past(d, today));
        Self {
            application,
            is_past_deadline,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub scholarship_name: Option<String>,
    pub organization: Option<String>,
    pub amount: Option<f64>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    pub scholarship_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub organization: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
}

impl Application {
    pub fn create(student_id: &str, input: NewApplication) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: new_id(),
            student_id: student_id.to_string(),
            scholarship_name: required_name(input.scholarship_name.as_deref())?,
            organization: clean_optional(input.organization.as_deref()),
            amount: validate_amount(input.amount)?,
            deadline: parse_deadline(input.deadline.as_deref())?,
            status: status_or_default(input.status.as_deref()),
            url: clean_optional(input.url.as_deref()),
            notes: clean_optional(input.notes.as_deref()),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: ApplicationPatch) -> Result<()> {
        if let Some(name) = patch.scholarship_name {
            self.scholarship_name = required_name(Some(&name))?;
        }
        if let Some(organization) = patch.organization {
            self.organization = clean_optional(organization.as_deref());
        }
        if let Some(amount) = patch.amount {
            self.amount = validate_amount(amount)?;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = parse_deadline(deadline.as_deref())?;
        }
        if let Some(status) = patch.status {
            self.status = status_or_default(Some(&status));
        }
        if let Some(url) = patch.url {
            self.url = clean_optional(url.as_deref());
        }
        if let Some(notes) = patch.notes {
            self.notes = clean_optional(notes.as_deref());
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn required_name(name: Option<&str>) -> Result<String> {
    let name = name.map(strip_html).unwrap_or_default();
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::missing("scholarshipName"));
    }
    Ok(name.to_string())
}

fn validate_amount(amount: Option<f64>) -> Result<Option<f64>> {
    match amount {
        Some(a) if !a.is_finite() || a < 0.0 => Err(TrackerError::validation(
            "amount",
            "amount must be a non-negative number",
        )),
        other => Ok(other),
    }
}

fn parse_deadline(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_date_field("deadline", v).map(Some),
        None => Ok(None),
    }
}

fn status_or_default(status: Option<&str>) -> String {
    clean_optional(status).unwrap_or_else(|| DEFAULT_STATUS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_normalizes_deadline() {
        let app = Application::create(
            "s1",
            NewApplication {
                scholarship_name: Some("Gates Scholarship".into()),
                deadline: Some("September 15, 2030".into()),
                amount: Some(5000.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(app.deadline, NaiveDate::from_ymd_opt(2030, 9, 15));
        assert_eq!(app.status, "planning");

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["deadline"], "2030-09-15");
        assert_eq!(json["scholarshipName"], "Gates Scholarship");
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Application::create("s1", NewApplication::default()).unwrap_err();
        assert_eq!(err.field(), Some("scholarshipName"));

        let err = Application::create(
            "s1",
            NewApplication {
                scholarship_name: Some("X".into()),
                amount: Some(-1.0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("amount"));

        let err = Application::create(
            "s1",
            NewApplication {
                scholarship_name: Some("X".into()),
                deadline: Some("whenever".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("deadline"));
    }

    #[test]
    fn test_view_flags_past_deadline() {
        let mut app = Application::create(
            "s1",
            NewApplication {
                scholarship_name: Some("X".into()),
                deadline: Some("2024-01-31".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(ApplicationView::new(app.clone(), today).is_past_deadline);

        app.deadline = None;
        let view = ApplicationView::new(app, today);
        assert!(!view.is_past_deadline);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isPastDeadline"], false);
        assert!(json["deadline"].is_null());
    }
}
