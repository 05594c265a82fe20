//! Collaborator-facing invitation endpoints
//!
//! No bearer token: whoever holds the link token may act on it.
//!
//! - `GET /api/invitations/:token` - open the invite (logs `viewed` once)
//! - `POST /api/invitations/:token/respond` - `{response: accept|decline, message?}`
//! - `POST /api/invitations/:token/delivery` - mail provider webhook,
//!   authenticated with the `X-Webhook-Secret` header

use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::lifecycle::{DeliveryReport, RespondRequest};
use crate::model::DeliveryStatus;
use crate::routes::{json_response, method_not_allowed, route_not_found, ApiRequest, FullBody};
use crate::server::AppState;
use crate::types::{Result, TrackerError};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryAck {
    delivery_status: DeliveryStatus,
}

pub async fn handle(
    req: &ApiRequest,
    state: &AppState,
    rest: &[&str],
) -> Result<Response<FullBody>> {
    match rest {
        [token] => match req.method {
            Method::GET => {
                let summary = state.invitations.view(token).await?;
                Ok(json_response(StatusCode::OK, &summary))
            }
            _ => Ok(method_not_allowed()),
        },
        [token, "respond"] => match req.method {
            Method::POST => {
                let body: RespondRequest = req.json()?;
                let summary = state.invitations.respond(token, body).await?;
                Ok(json_response(StatusCode::OK, &summary))
            }
            _ => Ok(method_not_allowed()),
        },
        [token, "delivery"] => match req.method {
            Method::POST => {
                check_webhook_secret(req, state.args.mailer_webhook_secret.as_deref())?;
                let body: DeliveryReport = req.json()?;
                let invitation = state.invitations.record_delivery(token, body).await?;
                Ok(json_response(
                    StatusCode::OK,
                    &DeliveryAck {
                        delivery_status: invitation.delivery_status,
                    },
                ))
            }
            _ => Ok(method_not_allowed()),
        },
        _ => Err(route_not_found(req)),
    }
}

/// Without a configured secret the webhook is closed
fn check_webhook_secret(req: &ApiRequest, expected: Option<&str>) -> Result<()> {
    let expected = expected
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TrackerError::Unauthorized("Delivery webhook is not configured".into()))?;
    let provided = req
        .header(WEBHOOK_SECRET_HEADER)
        .ok_or_else(|| TrackerError::Unauthorized("Missing webhook secret".into()))?;

    // Compare digests so the comparison time does not depend on a shared prefix
    if Sha256::digest(provided.as_bytes()) != Sha256::digest(expected.as_bytes()) {
        return Err(TrackerError::Unauthorized("Invalid webhook secret".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn with_secret(secret: Option<&'static str>) -> ApiRequest {
        let mut req = ApiRequest::new(Method::POST, "/api/invitations/t/delivery");
        if let Some(secret) = secret {
            req.headers
                .insert(WEBHOOK_SECRET_HEADER, HeaderValue::from_static(secret));
        }
        req
    }

    #[test]
    fn test_webhook_secret() {
        assert!(check_webhook_secret(&with_secret(Some("s3cret")), Some("s3cret")).is_ok());
        assert!(check_webhook_secret(&with_secret(Some("nope")), Some("s3cret")).is_err());
        assert!(check_webhook_secret(&with_secret(None), Some("s3cret")).is_err());
        assert!(check_webhook_secret(&with_secret(Some("s3cret")), None).is_err());
    }
}
