//! Collaborators: the teachers, counselors and mentors a student works with

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::model::{new_id, present};
use crate::types::{Result, TrackerError};
use crate::util::{clean_optional, strip_html};

/// How the collaborator knows the student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Teacher,
    Counselor,
    Mentor,
    Employer,
    #[default]
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Counselor => "counselor",
            Self::Mentor => "mentor",
            Self::Employer => "employer",
            Self::Other => "other",
        }
    }
}

impl FromStr for Relationship {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Self::Teacher),
            "counselor" | "counsellor" => Ok(Self::Counselor),
            "mentor" => Ok(Self::Mentor),
            "employer" => Ok(Self::Employer),
            "other" => Ok(Self::Other),
            other => Err(TrackerError::validation(
                "relationship",
                format!("unknown relationship '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub relationship: Relationship,
    pub organization: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollaborator {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<String>,
    pub organization: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    pub relationship: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub organization: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
}

impl Collaborator {
    pub fn create(student_id: &str, input: NewCollaborator) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: new_id(),
            student_id: student_id.to_string(),
            name: required_name(input.name.as_deref())?,
            email: validate_email(input.email.as_deref())?,
            phone: clean_optional(input.phone.as_deref()),
            relationship: match input.relationship {
                Some(r) => r.parse()?,
                None => Relationship::default(),
            },
            organization: clean_optional(input.organization.as_deref()),
            notes: clean_optional(input.notes.as_deref()),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: CollaboratorPatch) -> Result<()> {
        if let Some(name) = patch.name {
            self.name = required_name(Some(&name))?;
        }
        if let Some(email) = patch.email {
            self.email = validate_email(email.as_deref())?;
        }
        if let Some(phone) = patch.phone {
            self.phone = clean_optional(phone.as_deref());
        }
        if let Some(relationship) = patch.relationship {
            self.relationship = relationship.parse()?;
        }
        if let Some(organization) = patch.organization {
            self.organization = clean_optional(organization.as_deref());
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
        return Err(TrackerError::missing("name"));
    }
    Ok(name.to_string())
}

fn validate_email(email: Option<&str>) -> Result<Option<String>> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(TrackerError::validation(
            "email",
            format!("'{email}' is not a valid email address"),
        ));
    }

    Ok(Some(email.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: Option<&str>) -> NewCollaborator {
        NewCollaborator {
            name: Some(name.into()),
            email: email.map(Into::into),
            relationship: Some("Teacher".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_collaborator() {
        let c = Collaborator::create("s1", input(" Ms. Rivera ", Some("Rivera@School.edu"))).unwrap();
        assert_eq!(c.name, "Ms. Rivera");
        assert_eq!(c.email.as_deref(), Some("rivera@school.edu"));
        assert_eq!(c.relationship, Relationship::Teacher);
        assert_eq!(c.student_id, "s1");
    }

    #[test]
    fn test_name_required() {
        let err = Collaborator::create("s1", input("   ", None)).unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_email_validated() {
        for bad in ["rivera", "rivera@", "@school.edu", "a@b@c.edu", "a b@school.edu", "a@school"] {
            let err = Collaborator::create("s1", input("Rivera", Some(bad))).unwrap_err();
            assert_eq!(err.field(), Some("email"), "{bad}");
        }
    }

    #[test]
    fn test_patch_clears_email() {
        let mut c = Collaborator::create("s1", input("Rivera", Some("r@school.edu"))).unwrap();
        let patch: CollaboratorPatch = serde_json::from_str(r#"{"email": null, "notes": "AP Bio"}"#).unwrap();
        c.apply_patch(patch).unwrap();
        assert_eq!(c.email, None);
        assert_eq!(c.notes.as_deref(), Some("AP Bio"));
        assert_eq!(c.name, "Rivera");
    }
}
