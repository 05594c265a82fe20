//! Invitation delivery state, one per collaboration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Scheduled,
    Sent,
    Delivered,
    Bounced,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Bounced => "bounced",
            Self::Failed => "failed",
        }
    }

    /// Delivery never reached the recipient
    pub fn is_undelivered(&self) -> bool {
        matches!(self, Self::Bounced | Self::Failed)
    }
}

impl FromStr for DeliveryStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "bounced" => Ok(Self::Bounced),
            "failed" => Ok(Self::Failed),
            other => Err(TrackerError::validation(
                "status",
                format!("unknown delivery status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub collaboration_id: String,
    pub student_id: String,
    pub recipient_email: Option<String>,
    /// SHA-256 hex of the invite token; the token itself is never stored
    #[serde(skip_serializing, default)]
    pub token_hash: Option<String>,
    pub delivery_status: DeliveryStatus,
    /// Outcome of the latest send; survives a later schedule
    pub last_outcome: Option<DeliveryStatus>,
    pub sent_at: Option<DateTime<Utc>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub send_count: u32,
    pub last_error: Option<String>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(collaboration_id: &str, student_id: &str, status: DeliveryStatus) -> Self {
        let now = Utc::now();
        Self {
            collaboration_id: collaboration_id.to_string(),
            student_id: student_id.to_string(),
            recipient_email: None,
            token_hash: None,
            delivery_status: status,
            last_outcome: None,
            sent_at: None,
            scheduled_for: None,
            send_count: 0,
            last_error: None,
            viewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hash_never_serialized() {
        let mut invite = Invitation::new("c1", "s1", DeliveryStatus::Sent);
        invite.token_hash = Some("abc".into());
        let json = serde_json::to_value(&invite).unwrap();
        assert!(json.get("tokenHash").is_none());
        assert_eq!(json["deliveryStatus"], "sent");
    }

    #[test]
    fn test_undelivered() {
        assert!(DeliveryStatus::Bounced.is_undelivered());
        assert!(DeliveryStatus::Failed.is_undelivered());
        assert!(!DeliveryStatus::Delivered.is_undelivered());
        assert!("opened".parse::<DeliveryStatus>().is_err());
    }
}
