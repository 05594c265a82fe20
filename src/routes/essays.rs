//! Essay endpoints: `GET|PATCH|DELETE /api/essays/:id`
//!
//! Essays are created under their application.

use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::model::{Essay, EssayPatch};
use crate::routes::{
    empty_response, json_response, method_not_allowed, route_not_found, ApiRequest, FullBody,
};
use crate::server::AppState;
use crate::types::{Result, TrackerError};

/// Essay as returned by every essay route
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EssayView {
    #[serde(flatten)]
    essay: Essay,
    is_over_limit: bool,
}

impl From<Essay> for EssayView {
    fn from(essay: Essay) -> Self {
        Self {
            is_over_limit: essay.is_over_limit(),
            essay,
        }
    }
}

pub async fn handle(
    req: &ApiRequest,
    state: &AppState,
    user: &AuthUser,
    rest: &[&str],
) -> Result<Response<FullBody>> {
    let [id] = rest else {
        return Err(route_not_found(req));
    };

    match req.method {
        Method::GET => {
            let essay = find(state, user, id).await?;
            Ok(json_response(StatusCode::OK, &EssayView::from(essay)))
        }
        Method::PATCH => {
            let patch: EssayPatch = req.json()?;
            let mut essay = find(state, user, id).await?;
            essay.apply_patch(patch)?;
            state.repo.update_essay(&essay).await?;
            Ok(json_response(StatusCode::OK, &EssayView::from(essay)))
        }
        Method::DELETE => {
            if !state.repo.delete_essay(&user.user_id, id).await? {
                return Err(TrackerError::not_found("Essay not found"));
            }
            info!(essay_id = %id, "Essay deleted");
            Ok(empty_response(StatusCode::NO_CONTENT))
        }
        _ => Ok(method_not_allowed()),
    }
}

async fn find(state: &AppState, user: &AuthUser, id: &str) -> Result<Essay> {
    state
        .repo
        .get_essay(&user.user_id, id)
        .await?
        .ok_or_else(|| TrackerError::not_found("Essay not found"))
}
