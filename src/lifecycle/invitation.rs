//! Invitation dispatcher
//!
//! Sends, resends and schedules collaborator invitations, and serves the
//! collaborator side of the invite link.
//!
//! Every send mints a fresh token. Only its SHA-256 hex is stored; the raw
//! token exists in the email link and nowhere else, and a new send
//! invalidates older links.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::lifecycle::{
    ActionParty, CollaborationStatus, CollaborationType, HistoryAction, HistoryLog,
};
use crate::mailer::{InvitationMailer, InviteMessage};
use crate::model::{Collaboration, Collaborator, DeliveryStatus, Invitation};
use crate::store::Repository;
use crate::types::{Result, TrackerError};
use crate::util::{clean_optional, format_display};

/// Body of `POST /api/collaborations/:id/invite/schedule`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub scheduled_for: Option<String>,
}

/// Body of `POST /api/invitations/:token/respond`
#[derive(Debug, Default, Deserialize)]
pub struct RespondRequest {
    pub response: Option<String>,
    pub message: Option<String>,
}

/// Body of the mail provider's delivery webhook
#[derive(Debug, Default, Deserialize)]
pub struct DeliveryReport {
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Result of a send, resend or schedule
#[derive(Debug, Clone, Serialize)]
pub struct InviteOutcome {
    pub collaboration: Collaboration,
    pub invitation: Invitation,
}

/// What the invitee sees when opening the link
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationSummary {
    pub collaboration_type: CollaborationType,
    pub status: CollaborationStatus,
    pub next_action_due_date: Option<chrono::NaiveDate>,
    pub portal_url: Option<String>,
}

impl From<&Collaboration> for InvitationSummary {
    fn from(c: &Collaboration) -> Self {
        Self {
            collaboration_type: c.collaboration_type,
            status: c.status,
            next_action_due_date: c.next_action_due_date,
            portal_url: c.portal_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendKind {
    Initial,
    Reminder,
}

pub struct InvitationDispatcher {
    repo: Arc<dyn Repository>,
    history: HistoryLog,
    mailer: Arc<dyn InvitationMailer>,
    invite_base_url: String,
    mail_from: String,
    resend_after: Duration,
}

impl InvitationDispatcher {
    pub fn new(
        repo: Arc<dyn Repository>,
        mailer: Arc<dyn InvitationMailer>,
        invite_base_url: impl Into<String>,
        mail_from: impl Into<String>,
        resend_after_days: i64,
    ) -> Self {
        Self {
            history: HistoryLog::new(repo.clone()),
            repo,
            mailer,
            invite_base_url: invite_base_url.into(),
            mail_from: mail_from.into(),
            resend_after: Duration::days(resend_after_days),
        }
    }

    /// Email the collaborator now
    pub async fn send(&self, student_id: &str, collaboration_id: &str) -> Result<InviteOutcome> {
        let collaboration = self.owned_collaboration(student_id, collaboration_id).await?;
        self.deliver(collaboration, SendKind::Initial).await
    }

    /// Send again, once the last invite bounced, failed or went stale.
    ///
    /// The bounce check reads `last_outcome`, so scheduling a send after a
    /// bounce still allows an immediate resend.
    pub async fn resend(&self, student_id: &str, collaboration_id: &str) -> Result<InviteOutcome> {
        let collaboration = self.owned_collaboration(student_id, collaboration_id).await?;

        let invitation = self.repo.get_invitation(&collaboration.id).await?;
        let Some(sent_at) = invitation.as_ref().and_then(|i| i.sent_at) else {
            return Err(TrackerError::validation(
                "invitation",
                "No invitation has been sent yet",
            ));
        };
        let undelivered = invitation
            .as_ref()
            .and_then(|i| i.last_outcome)
            .is_some_and(|outcome| outcome.is_undelivered());

        if !undelivered && Utc::now() - sent_at <= self.resend_after {
            return Err(TrackerError::validation(
                "invitation",
                format!(
                    "Invitation was sent {}; wait {} days before resending",
                    sent_at.format("%Y-%m-%d %H:%M UTC"),
                    self.resend_after.num_days()
                ),
            ));
        }

        self.deliver(collaboration, SendKind::Reminder).await
    }

    /// Record a future send time; the collaboration status is left alone
    pub async fn schedule(
        &self,
        student_id: &str,
        collaboration_id: &str,
        req: ScheduleRequest,
    ) -> Result<InviteOutcome> {
        let collaboration = self.owned_collaboration(student_id, collaboration_id).await?;

        let raw = req
            .scheduled_for
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrackerError::missing("scheduledFor"))?;
        let scheduled_for = parse_schedule_time(raw).ok_or_else(|| {
            TrackerError::validation(
                "scheduledFor",
                format!("scheduledFor must be an ISO 8601 timestamp, got '{raw}'"),
            )
        })?;

        if scheduled_for <= Utc::now() {
            return Err(TrackerError::validation(
                "scheduledFor",
                "scheduledFor must be in the future",
            ));
        }

        let mut invitation = self.invitation_for(&collaboration).await?;
        invitation.delivery_status = DeliveryStatus::Scheduled;
        invitation.scheduled_for = Some(scheduled_for);
        invitation.updated_at = Utc::now();
        self.repo.save_invitation(&invitation).await?;

        info!(
            collaboration_id = %collaboration.id,
            scheduled_for = %scheduled_for,
            "Invitation scheduled"
        );

        Ok(InviteOutcome {
            collaboration,
            invitation,
        })
    }

    /// Collaborator opened the invite link
    pub async fn view(&self, token: &str) -> Result<InvitationSummary> {
        let (mut invitation, collaboration) = self.resolve_token(token).await?;

        if invitation.viewed_at.is_none() {
            let now = Utc::now();
            invitation.viewed_at = Some(now);
            invitation.updated_at = now;
            self.repo.save_invitation(&invitation).await?;
            self.history
                .append(
                    &collaboration.id,
                    HistoryAction::Viewed,
                    "Invitation opened by collaborator",
                )
                .await?;
        }

        Ok(InvitationSummary::from(&collaboration))
    }

    /// Collaborator accepts or declines
    pub async fn respond(&self, token: &str, req: RespondRequest) -> Result<InvitationSummary> {
        let (_, mut collaboration) = self.resolve_token(token).await?;

        let (status, awaiting, action, verb) = match req.response.as_deref().map(str::trim) {
            Some("accept") => (
                CollaborationStatus::InProgress,
                ActionParty::Collaborator,
                HistoryAction::Accepted,
                "accepted",
            ),
            Some("decline") => (
                CollaborationStatus::Declined,
                ActionParty::Student,
                HistoryAction::Declined,
                "declined",
            ),
            Some(other) => {
                return Err(TrackerError::validation(
                    "response",
                    format!("response must be 'accept' or 'decline', got '{other}'"),
                ))
            }
            None => return Err(TrackerError::missing("response")),
        };

        collaboration.status = status;
        collaboration.awaiting_action_from = Some(awaiting);
        collaboration.updated_at = Utc::now();
        self.repo.update_collaboration(&collaboration).await?;

        let details = match clean_optional(req.message.as_deref()) {
            Some(message) => format!("Collaborator {verb} the invitation: {message}"),
            None => format!("Collaborator {verb} the invitation"),
        };
        self.history.append(&collaboration.id, action, &details).await?;

        info!(collaboration_id = %collaboration.id, action = %action, "Invitation answered");
        Ok(InvitationSummary::from(&collaboration))
    }

    /// Mail provider delivery report; touches delivery state only
    pub async fn record_delivery(&self, token: &str, report: DeliveryReport) -> Result<Invitation> {
        let (mut invitation, _) = self.resolve_token(token).await?;

        let status: DeliveryStatus = report
            .status
            .as_deref()
            .ok_or_else(|| TrackerError::missing("status"))?
            .trim()
            .parse()?;
        if !matches!(
            status,
            DeliveryStatus::Delivered | DeliveryStatus::Bounced | DeliveryStatus::Failed
        ) {
            return Err(TrackerError::validation(
                "status",
                "status must be delivered, bounced or failed",
            ));
        }

        invitation.delivery_status = status;
        invitation.last_outcome = Some(status);
        invitation.last_error = if status.is_undelivered() {
            clean_optional(report.error.as_deref())
        } else {
            None
        };
        invitation.updated_at = Utc::now();
        self.repo.save_invitation(&invitation).await?;

        info!(
            collaboration_id = %invitation.collaboration_id,
            delivery_status = status.as_str(),
            "Delivery status updated"
        );
        Ok(invitation)
    }

    async fn deliver(
        &self,
        mut collaboration: Collaboration,
        kind: SendKind,
    ) -> Result<InviteOutcome> {
        let collaborator = self
            .repo
            .get_collaborator(&collaboration.student_id, &collaboration.collaborator_id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Collaborator not found"))?;
        let Some(email) = collaborator.email.clone() else {
            return Err(TrackerError::validation(
                "email",
                format!("{} has no email address", collaborator.name),
            ));
        };

        let scholarship = self
            .repo
            .get_application(&collaboration.student_id, &collaboration.application_id)
            .await?
            .map(|a| a.scholarship_name);

        let token = mint_token();
        let message = self.compose(
            &collaborator,
            &email,
            &collaboration,
            scholarship.as_deref(),
            &token,
            kind,
        );

        let mut invitation = self.invitation_for(&collaboration).await?;
        invitation.recipient_email = Some(email.clone());
        let now = Utc::now();
        invitation.updated_at = now;

        if let Err(err) = self.mailer.send(&message).await {
            warn!(
                collaboration_id = %collaboration.id,
                error = %err,
                "Invitation email failed"
            );
            invitation.delivery_status = DeliveryStatus::Failed;
            invitation.last_outcome = Some(DeliveryStatus::Failed);
            invitation.last_error = Some(err.to_string());
            self.repo.save_invitation(&invitation).await?;
            return Err(match err {
                TrackerError::Mailer(_) => err,
                other => TrackerError::Mailer(other.to_string()),
            });
        }

        invitation.token_hash = Some(hash_token(&token));
        invitation.delivery_status = DeliveryStatus::Sent;
        invitation.last_outcome = Some(DeliveryStatus::Sent);
        invitation.sent_at = Some(now);
        invitation.scheduled_for = None;
        invitation.send_count += 1;
        invitation.last_error = None;
        invitation.viewed_at = None;
        self.repo.save_invitation(&invitation).await?;

        collaboration.status = CollaborationStatus::Invited;
        collaboration.awaiting_action_from = Some(ActionParty::Collaborator);
        collaboration.updated_at = now;
        self.repo.update_collaboration(&collaboration).await?;

        let (action, details) = match kind {
            SendKind::Initial => (
                HistoryAction::Invited,
                format!("Invitation sent to {} <{}>", collaborator.name, email),
            ),
            SendKind::Reminder => (
                HistoryAction::ReminderSent,
                format!("Invitation resent to {} <{}>", collaborator.name, email),
            ),
        };
        self.history.append(&collaboration.id, action, &details).await?;

        info!(
            collaboration_id = %collaboration.id,
            action = %action,
            send_count = invitation.send_count,
            "Invitation sent"
        );

        Ok(InviteOutcome {
            collaboration,
            invitation,
        })
    }

    fn compose(
        &self,
        collaborator: &Collaborator,
        email: &str,
        collaboration: &Collaboration,
        scholarship: Option<&str>,
        token: &str,
        kind: SendKind,
    ) -> InviteMessage {
        let link = format!("{}/{}", self.invite_base_url.trim_end_matches('/'), token);
        let task = match collaboration.collaboration_type {
            CollaborationType::Recommendation => "a letter of recommendation",
            CollaborationType::EssayReview => "an essay review",
            CollaborationType::Guidance => "some guidance",
        };
        let subject = match (kind, collaboration.collaboration_type) {
            (SendKind::Initial, CollaborationType::Recommendation) => "Recommendation request",
            (SendKind::Initial, CollaborationType::EssayReview) => "Essay review request",
            (SendKind::Initial, CollaborationType::Guidance) => "Request for guidance",
            (SendKind::Reminder, _) => "Reminder: a student is waiting on your help",
        };

        let mut text = format!("Hi {},\n\nA student has asked you for {}", collaborator.name, task);
        if let Some(name) = scholarship {
            text.push_str(&format!(" for their {} application", name));
        }
        text.push('.');
        if let Some(due) = collaboration.next_action_due_date {
            text.push_str(&format!(" It is due {}.", format_display(due)));
        }
        text.push_str(&format!("\n\nOpen the request to accept or decline:\n{}\n", link));

        InviteMessage {
            to: email.to_string(),
            from: self.mail_from.clone(),
            subject: subject.to_string(),
            text,
            link,
        }
    }

    async fn owned_collaboration(&self, student_id: &str, id: &str) -> Result<Collaboration> {
        self.repo
            .get_collaboration(student_id, id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Collaboration not found"))
    }

    async fn invitation_for(&self, collaboration: &Collaboration) -> Result<Invitation> {
        Ok(self
            .repo
            .get_invitation(&collaboration.id)
            .await?
            .unwrap_or_else(|| {
                Invitation::new(
                    &collaboration.id,
                    &collaboration.student_id,
                    DeliveryStatus::Scheduled,
                )
            }))
    }

    async fn resolve_token(&self, token: &str) -> Result<(Invitation, Collaboration)> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TrackerError::not_found("Invitation not found"));
        }

        let invitation = self
            .repo
            .find_invitation_by_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| TrackerError::not_found("Invitation not found"))?;
        let collaboration = self
            .repo
            .find_collaboration(&invitation.collaboration_id)
            .await?
            .ok_or_else(|| TrackerError::not_found("Invitation not found"))?;

        Ok((invitation, collaboration))
    }
}

/// ISO 8601 timestamp; values without an offset are taken as UTC
fn parse_schedule_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn mint_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// SHA-256 hex of an invite token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
