//! Outbound invitation email
//!
//! The lifecycle hands finished messages to an [`InvitationMailer`]; actual
//! delivery belongs to an external mail service. Without `MAILER_URL` the
//! server uses [`LogMailer`], which only logs.

pub mod webhook;

pub use webhook::{WebhookMailer, WebhookMailerConfig};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::types::Result;

/// A rendered invitation email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    /// Invite link carrying the raw token
    pub link: String,
}

/// Notification port for invitation emails
#[async_trait]
pub trait InvitationMailer: Send + Sync {
    /// Short name for startup logs
    fn name(&self) -> &'static str;

    /// Hand one message to the mail service. An error means it was not accepted.
    async fn send(&self, message: &InviteMessage) -> Result<()>;
}

/// Logs messages instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl InvitationMailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &InviteMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            link = %message.link,
            "Invitation email (not sent, no MAILER_URL configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        let message = InviteMessage {
            to: "smith@school.edu".into(),
            from: "no-reply@example.org".into(),
            subject: "Recommendation request".into(),
            text: "Hello".into(),
            link: "http://localhost:5173/invite/abc".into(),
        };
        assert!(LogMailer.send(&message).await.is_ok());
        assert_eq!(LogMailer.name(), "log");
    }
}
