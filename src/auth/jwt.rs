//! JWT bearer token handling
//!
//! Tokens follow the hosted identity provider's shape: HS256-signed, with
//! the user id in `sub` and an audience of `authenticated`.
//!
//! Token generation exists for dev tooling and tests; production tokens
//! come from the identity provider.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::TrackerError;

const MIN_SECRET_LEN: usize = 32;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

fn default_role() -> String {
    "authenticated".to_string()
}

/// Input for creating a new token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: String,
    pub email: Option<String>,
}

/// Result of token validation
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl TokenValidationResult {
    pub fn valid(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error.into()),
        }
    }
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    audience: String,
    expiry_seconds: u64,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("audience", &self.audience)
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(
        secret: String,
        audience: impl Into<String>,
        expiry_seconds: u64,
    ) -> Result<Self, TrackerError> {
        if secret.is_empty() {
            return Err(TrackerError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(TrackerError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self {
            secret,
            audience: audience.into(),
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode
    pub fn new_dev(audience: impl Into<String>) -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            audience: audience.into(),
            expiry_seconds: 3600,
        }
    }

    /// Generate a signed token for a user
    pub fn generate_token(&self, input: TokenInput) -> Result<String, TrackerError> {
        let now = unix_now()?;
        self.sign(Claims {
            sub: input.user_id,
            email: input.email,
            role: default_role(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.expiry_seconds,
        })
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: Claims) -> Result<String, TrackerError> {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TrackerError::Unauthorized(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(token_data) if token_data.claims.sub.is_empty() => {
                TokenValidationResult::invalid("Token has no subject")
            }
            Ok(token_data) => TokenValidationResult::valid(token_data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let error_msg = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    ErrorKind::InvalidAudience => "Invalid audience",
                    _ => "Token validation failed",
                };
                TokenValidationResult::invalid(error_msg)
            }
        }
    }
}

fn unix_now() -> Result<u64, TrackerError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TrackerError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            "authenticated",
            3600,
        )
        .unwrap()
    }

    fn input() -> TokenInput {
        TokenInput {
            user_id: "student-123".into(),
            email: Some("student@example.com".into()),
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let validator = test_validator();

        let token = validator.generate_token(input()).unwrap();
        let result = validator.verify_token(&token);
        assert!(result.valid);

        let claims = result.claims.unwrap();
        assert_eq!(claims.sub, "student-123");
        assert_eq!(claims.email.as_deref(), Some("student@example.com"));
        assert_eq!(claims.role, "authenticated");
    }

    #[test]
    fn test_invalid_token() {
        let result = test_validator().verify_token("invalid-token");
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtValidator::new(
            "different-secret-that-is-at-least-32-characters".into(),
            "authenticated",
            3600,
        )
        .unwrap();

        let token = test_validator().generate_token(input()).unwrap();
        assert!(!other.verify_token(&token).valid);
    }

    #[test]
    fn test_wrong_audience() {
        let service = JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            "service_role",
            3600,
        )
        .unwrap();

        let token = service.generate_token(input()).unwrap();
        let result = test_validator().verify_token(&token);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Invalid audience"));
    }

    #[test]
    fn test_expired_token() {
        let validator = test_validator();
        let now = unix_now().unwrap();
        let token = validator
            .sign(Claims {
                sub: "student-123".into(),
                email: None,
                role: "authenticated".into(),
                aud: "authenticated".into(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        let result = validator.verify_token(&token);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Token expired"));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_secret_validation() {
        assert!(JwtValidator::new("short".into(), "authenticated", 3600).is_err());
        assert!(JwtValidator::new("".into(), "authenticated", 3600).is_err());
        assert!(JwtValidator::new(
            "this-secret-is-at-least-32-chars-long".into(),
            "authenticated",
            3600
        )
        .is_ok());
    }
}
