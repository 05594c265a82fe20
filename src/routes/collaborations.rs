//! Collaboration endpoints
//!
//! - `GET /api/collaborations?applicationId=&collaboratorId=&status=`
//! - `POST /api/collaborations` - 201 on success
//! - `GET|PATCH|DELETE /api/collaborations/:id`
//! - `GET|POST /api/collaborations/:id/history`
//! - `POST /api/collaborations/:id/invite`
//! - `POST /api/collaborations/:id/invite/resend`
//! - `POST /api/collaborations/:id/invite/schedule`

use hyper::{Method, Response, StatusCode};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::lifecycle::{
    CollaborationPatch, CollaborationStatus, ManualHistoryRequest, NewCollaborationRequest,
    ScheduleRequest,
};
use crate::model::CollaborationFilter;
use crate::routes::{
    empty_response, json_response, method_not_allowed, route_not_found, ApiRequest, FullBody,
};
use crate::server::AppState;
use crate::types::{Result, TrackerError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    application_id: Option<String>,
    collaborator_id: Option<String>,
    status: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<CollaborationFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(
                value
                    .parse::<CollaborationStatus>()
                    .map_err(|message| TrackerError::validation("status", message))?,
            ),
        };
        Ok(CollaborationFilter {
            application_id: self.application_id.filter(|s| !s.is_empty()),
            collaborator_id: self.collaborator_id.filter(|s| !s.is_empty()),
            status,
        })
    }
}

pub async fn handle(
    req: &ApiRequest,
    state: &AppState,
    user: &AuthUser,
    rest: &[&str],
) -> Result<Response<FullBody>> {
    let student = user.user_id.as_str();
    let service = &state.collaborations;

    match rest {
        [] => match req.method {
            Method::GET => {
                let filter = req.query::<ListQuery>()?.into_filter()?;
                let collaborations = service.list(student, &filter).await?;
                Ok(json_response(StatusCode::OK, &collaborations))
            }
            Method::POST => {
                let body: NewCollaborationRequest = req.json()?;
                let created = service.create(student, body).await?;
                Ok(json_response(StatusCode::CREATED, &created))
            }
            _ => Ok(method_not_allowed()),
        },
        [id] => match req.method {
            Method::GET => Ok(json_response(StatusCode::OK, &service.get(student, id).await?)),
            Method::PATCH => {
                let patch: CollaborationPatch = req.json()?;
                let updated = service.update(student, id, patch).await?;
                Ok(json_response(StatusCode::OK, &updated))
            }
            Method::DELETE => {
                service.delete(student, id).await?;
                Ok(empty_response(StatusCode::NO_CONTENT))
            }
            _ => Ok(method_not_allowed()),
        },
        [id, "history"] => match req.method {
            Method::GET => Ok(json_response(
                StatusCode::OK,
                &service.history(student, id).await?,
            )),
            Method::POST => {
                let body: ManualHistoryRequest = req.json()?;
                let entry = service.add_history(student, id, body).await?;
                Ok(json_response(StatusCode::CREATED, &entry))
            }
            _ => Ok(method_not_allowed()),
        },
        [id, "invite"] if req.method == Method::POST => {
            let outcome = state.invitations.send(student, id).await?;
            Ok(json_response(StatusCode::OK, &outcome))
        }
        [id, "invite", "resend"] if req.method == Method::POST => {
            let outcome = state.invitations.resend(student, id).await?;
            Ok(json_response(StatusCode::OK, &outcome))
        }
        [id, "invite", "schedule"] if req.method == Method::POST => {
            let body: ScheduleRequest = req.json()?;
            let outcome = state.invitations.schedule(student, id, body).await?;
            Ok(json_response(StatusCode::OK, &outcome))
        }
        [_, "invite", ..] => Ok(method_not_allowed()),
        _ => Err(route_not_found(req)),
    }
}
