//! Authentication for the tracker API
//!
//! Bearer tokens are issued by the external identity provider and signed
//! with its shared HS256 secret. We only verify them.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};

use hyper::HeaderMap;

use crate::types::{Result, TrackerError};

/// The authenticated student behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Identity provider user id (`sub` claim)
    pub user_id: String,
    pub email: Option<String>,
}

/// Resolve the caller from the `Authorization` header.
pub fn authenticate(headers: &HeaderMap, validator: &JwtValidator) -> Result<AuthUser> {
    let header = headers
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(header)
        .ok_or_else(|| TrackerError::Unauthorized("No token provided".into()))?;

    let result = validator.verify_token(token);
    match result.claims {
        Some(claims) if result.valid => Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        }),
        _ => Err(TrackerError::Unauthorized(
            result.error.unwrap_or_else(|| "Invalid token".into()),
        )),
    }
}
