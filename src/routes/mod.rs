//! HTTP API routes
//!
//! The server collects each request into an [`ApiRequest`] and hands it to
//! [`dispatch`], which authenticates, routes on path segments and turns
//! handler errors into JSON error bodies.
//!
//! ## Endpoints
//!
//! - `GET /health`, `/healthz`, `/version`
//! - `/api/collaborators[/:id]`
//! - `/api/applications[/:id[/essays|/collaborations]]`
//! - `/api/essays/:id`
//! - `/api/collaborations[/:id[/history|/invite[/resend|/schedule]]]`
//! - `/api/invitations/:token[/respond|/delivery]` (no bearer token)

pub mod applications;
pub mod collaborations;
pub mod collaborators;
pub mod essays;
pub mod health;
pub mod invitations;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::authenticate;
use crate::server::AppState;
use crate::types::{Result, TrackerError};

pub type FullBody = Full<Bytes>;

/// A fully buffered request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the JSON body; an empty body is a bad request
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(TrackerError::BadRequest("Request body is required".into()));
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserialize the query string (missing query = all defaults)
    pub fn query<T: DeserializeOwned>(&self) -> Result<T> {
        serde_urlencoded::from_str(self.query.as_deref().unwrap_or(""))
            .map_err(|e| TrackerError::BadRequest(format!("Invalid query string: {}", e)))
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

/// Route a request and render the outcome
pub async fn dispatch(req: ApiRequest, state: &AppState) -> Response<FullBody> {
    match route(&req, state).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                warn!(method = %req.method, path = %req.path, error = %err, "Request failed");
            } else {
                debug!(method = %req.method, path = %req.path, error = %err, "Request rejected");
            }
            error_response(&err)
        }
    }
}

async fn route(req: &ApiRequest, state: &AppState) -> Result<Response<FullBody>> {
    let segments: Vec<&str> = req
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        ["health"] | ["healthz"] if req.method == Method::GET => Ok(health::health_check(state)),
        ["version"] if req.method == Method::GET => Ok(health::version_info()),

        // The invite token is the credential here
        ["api", "invitations", rest @ ..] => invitations::handle(req, state, rest).await,

        ["api", resource, rest @ ..] => {
            let user = authenticate(&req.headers, &state.jwt)?;
            match *resource {
                "collaborators" => collaborators::handle(req, state, &user, rest).await,
                "applications" => applications::handle(req, state, &user, rest).await,
                "essays" => essays::handle(req, state, &user, rest).await,
                "collaborations" => collaborations::handle(req, state, &user, rest).await,
                _ => Err(route_not_found(req)),
            }
        }

        _ => Err(route_not_found(req)),
    }
}

pub(crate) fn route_not_found(req: &ApiRequest) -> TrackerError {
    TrackerError::not_found(format!("No route for {} {}", req.method, req.path))
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn empty_response(status: StatusCode) -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

pub fn error_response(err: &TrackerError) -> Response<FullBody> {
    json_response(
        err.status_code(),
        &ErrorResponse {
            error: err.public_message(),
            code: err.code(),
            field: err.field(),
        },
    )
}

pub fn method_not_allowed() -> Response<FullBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method not allowed", "code": "METHOD_NOT_ALLOWED" }),
    )
}
