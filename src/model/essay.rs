//! Essays attached to an application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{new_id, present};
use crate::types::{Result, TrackerError};
use crate::util::{clean_optional, strip_html};

const DEFAULT_STATUS: &str = "draft";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Essay {
    pub id: String,
    pub student_id: String,
    pub application_id: String,
    pub title: String,
    pub prompt: Option<String>,
    pub content: String,
    pub word_count: u32,
    pub word_limit: Option<u32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEssay {
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub content: Option<String>,
    pub word_limit: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub prompt: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub word_limit: Option<Option<u32>>,
    pub status: Option<String>,
}

impl Essay {
    pub fn create(student_id: &str, application_id: &str, input: NewEssay) -> Result<Self> {
        let now = Utc::now();
        let content = input.content.as_deref().map(strip_html).unwrap_or_default();
        Ok(Self {
            id: new_id(),
            student_id: student_id.to_string(),
            application_id: application_id.to_string(),
            title: required_title(input.title.as_deref())?,
            prompt: clean_optional(input.prompt.as_deref()),
            word_count: word_count(&content),
            content,
            word_limit: validate_limit(input.word_limit)?,
            status: clean_optional(input.status.as_deref())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: EssayPatch) -> Result<()> {
        if let Some(title) = patch.title {
            self.title = required_title(Some(&title))?;
        }
        if let Some(prompt) = patch.prompt {
            self.prompt = clean_optional(prompt.as_deref());
        }
        if let Some(content) = patch.content {
            self.content = strip_html(&content);
            self.word_count = word_count(&self.content);
        }
        if let Some(limit) = patch.word_limit {
            self.word_limit = validate_limit(limit)?;
        }
        if let Some(status) = patch.status {
            self.status = clean_optional(Some(&status)).unwrap_or_else(|| DEFAULT_STATUS.to_string());
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_over_limit(&self) -> bool {
        self.word_limit.is_some_and(|limit| self.word_count > limit)
    }
}

fn word_count(content: &str) -> u32 {
    content.split_whitespace().count() as u32
}

fn required_title(title: Option<&str>) -> Result<String> {
    let title = title.map(strip_html).unwrap_or_default();
    let title = title.trim();
    if title.is_empty() {
        return Err(TrackerError::missing("title"));
    }
    Ok(title.to_string())
}

fn validate_limit(limit: Option<u32>) -> Result<Option<u32>> {
    match limit {
        Some(0) => Err(TrackerError::validation(
            "wordLimit",
            "wordLimit must be greater than zero",
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_tracks_content() {
        let mut essay = Essay::create(
            "s1",
            "a1",
            NewEssay {
                title: Some("Why nursing".into()),
                content: Some("<p>I want to   help people.</p>".into()),
                word_limit: Some(4),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(essay.content, "I want to   help people.");
        assert_eq!(essay.word_count, 5);
        assert!(essay.is_over_limit());

        essay
            .apply_patch(EssayPatch {
                content: Some("Shorter now.".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(essay.word_count, 2);
        assert!(!essay.is_over_limit());
        assert_eq!(essay.status, "draft");
    }

    #[test]
    fn test_title_and_limit_validated() {
        let err = Essay::create("s1", "a1", NewEssay::default()).unwrap_err();
        assert_eq!(err.field(), Some("title"));

        let err = Essay::create(
            "s1",
            "a1",
            NewEssay {
                title: Some("T".into()),
                word_limit: Some(0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("wordLimit"));
    }
}
