//! HTTP server and shared state

pub mod http;

pub use http::run;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::lifecycle::{CollaborationService, InvitationDispatcher};
use crate::mailer::{InvitationMailer, LogMailer, WebhookMailer, WebhookMailerConfig};
use crate::store::Repository;
use crate::types::{Result, TrackerError};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Record store (MongoDB or in-memory)
    pub repo: Arc<dyn Repository>,
    /// Invitation email port
    pub mailer: Arc<dyn InvitationMailer>,
    /// Verifies identity provider bearer tokens
    pub jwt: JwtValidator,
    pub collaborations: CollaborationService,
    pub invitations: InvitationDispatcher,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        repo: Arc<dyn Repository>,
        mailer: Arc<dyn InvitationMailer>,
    ) -> Result<Self> {
        let jwt = match args.jwt_secret.clone() {
            Some(secret) if !secret.is_empty() => {
                JwtValidator::new(secret, args.jwt_audience.clone(), args.jwt_expiry_seconds)?
            }
            _ if args.dev_mode => JwtValidator::new_dev(args.jwt_audience.clone()),
            _ => {
                return Err(TrackerError::Config(
                    "JWT_SECRET is required in production mode".into(),
                ))
            }
        };

        let invitations = InvitationDispatcher::new(
            repo.clone(),
            mailer.clone(),
            args.invite_base_url(),
            args.mailer_from.clone(),
            args.invite_resend_after_days,
        );

        Ok(Self {
            collaborations: CollaborationService::new(repo.clone()),
            invitations,
            jwt,
            repo,
            mailer,
            args,
            started_at: Instant::now(),
        })
    }
}

/// Mailer selected by configuration: webhook when `MAILER_URL` is set
pub fn mailer_from_args(args: &Args) -> Result<Arc<dyn InvitationMailer>> {
    match args.mailer_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => Ok(Arc::new(WebhookMailer::new(WebhookMailerConfig {
            url: url.to_string(),
            api_key: args.mailer_api_key.clone(),
            timeout: Duration::from_millis(args.request_timeout_ms),
        })?)),
        None => Ok(Arc::new(LogMailer)),
    }
}
