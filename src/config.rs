//! Configuration for the tracker API
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Scholarship tracker API server
#[derive(Parser, Debug, Clone)]
#[command(name = "scholarship-tracker")]
#[command(about = "REST API for scholarship applications, essays and collaborator workflows")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (dev JWT secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "scholarships")]
    pub mongodb_db: String,

    /// Identity provider JWT secret used to verify bearer tokens
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Expected `aud` claim on bearer tokens
    #[arg(long, env = "JWT_AUDIENCE", default_value = "authenticated")]
    pub jwt_audience: String,

    /// Lifetime of tokens minted by this server (dev tooling and tests)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Frontend base URL, used to build invite links
    #[arg(long, env = "APP_BASE_URL", default_value = "http://localhost:5173")]
    pub app_base_url: String,

    /// Mail service endpoint; invitations are only logged when unset
    #[arg(long, env = "MAILER_URL")]
    pub mailer_url: Option<String>,

    /// Bearer key for the mail service
    #[arg(long, env = "MAILER_API_KEY")]
    pub mailer_api_key: Option<String>,

    /// Sender address for invitation emails
    #[arg(long, env = "MAILER_FROM", default_value = "no-reply@scholarship-tracker.local")]
    pub mailer_from: String,

    /// Shared secret the mail provider sends with delivery webhooks
    #[arg(long, env = "MAILER_WEBHOOK_SECRET")]
    pub mailer_webhook_secret: Option<String>,

    /// Days after which a sent invitation counts as stale and may be resent
    #[arg(long, env = "INVITE_RESEND_AFTER_DAYS", default_value = "3")]
    pub invite_resend_after_days: i64,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Outbound HTTP timeout in milliseconds (mail service)
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None | Some("") => {
                    return Err("JWT_SECRET is required in production mode".to_string())
                }
                Some(secret) if secret.len() < 32 => {
                    return Err("JWT_SECRET must be at least 32 characters".to_string())
                }
                _ => {}
            }

            if self.mongodb_uri.is_none() {
                return Err("MONGODB_URI is required in production mode".to_string());
            }
        }

        if self.invite_resend_after_days < 0 {
            return Err("INVITE_RESEND_AFTER_DAYS must not be negative".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(format!("LOG_FORMAT must be 'text' or 'json', got '{}'", self.log_format));
        }

        Ok(())
    }

    /// Invite link base without a trailing slash
    pub fn invite_base_url(&self) -> String {
        format!("{}/invite", self.app_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["scholarship-tracker"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_dev_mode_needs_no_secrets() {
        let args = parse(&["--dev-mode"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.invite_resend_after_days, 3);
    }

    #[test]
    fn test_production_requires_secret_and_database() {
        let args = parse(&[]);
        assert!(args.validate().unwrap_err().contains("JWT_SECRET"));

        let args = parse(&["--jwt-secret", "short"]);
        assert!(args.validate().unwrap_err().contains("32"));

        let args = parse(&["--jwt-secret", "0123456789abcdef0123456789abcdef"]);
        assert!(args.validate().unwrap_err().contains("MONGODB_URI"));

        let args = parse(&[
            "--jwt-secret",
            "0123456789abcdef0123456789abcdef",
            "--mongodb-uri",
            "mongodb://localhost:27017",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_invite_base_url_trims_slash() {
        let args = parse(&["--dev-mode", "--app-base-url", "https://app.example.org/"]);
        assert_eq!(args.invite_base_url(), "https://app.example.org/invite");
    }
}
