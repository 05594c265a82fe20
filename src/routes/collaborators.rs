//! Collaborator endpoints
//!
//! - `GET /api/collaborators` - list, oldest first
//! - `POST /api/collaborators` - create
//! - `GET|PATCH|DELETE /api/collaborators/:id`

use hyper::{Method, Response, StatusCode};
use tracing::info;

use crate::auth::AuthUser;
use crate::model::{Collaborator, CollaboratorPatch, NewCollaborator};
use crate::routes::{
    empty_response, json_response, method_not_allowed, route_not_found, ApiRequest, FullBody,
};
use crate::server::AppState;
use crate::types::{Result, TrackerError};

pub async fn handle(
    req: &ApiRequest,
    state: &AppState,
    user: &AuthUser,
    rest: &[&str],
) -> Result<Response<FullBody>> {
    match rest {
        [] => match req.method {
            Method::GET => list(state, user).await,
            Method::POST => create(req, state, user).await,
            _ => Ok(method_not_allowed()),
        },
        [id] => match req.method {
            Method::GET => get(state, user, id).await,
            Method::PATCH => update(req, state, user, id).await,
            Method::DELETE => delete(state, user, id).await,
            _ => Ok(method_not_allowed()),
        },
        _ => Err(route_not_found(req)),
    }
}

async fn list(state: &AppState, user: &AuthUser) -> Result<Response<FullBody>> {
    let collaborators = state.repo.list_collaborators(&user.user_id).await?;
    Ok(json_response(StatusCode::OK, &collaborators))
}

async fn create(req: &ApiRequest, state: &AppState, user: &AuthUser) -> Result<Response<FullBody>> {
    let input: NewCollaborator = req.json()?;
    let collaborator = Collaborator::create(&user.user_id, input)?;
    state.repo.insert_collaborator(&collaborator).await?;

    info!(collaborator_id = %collaborator.id, "Collaborator created");
    Ok(json_response(StatusCode::CREATED, &collaborator))
}

async fn get(state: &AppState, user: &AuthUser, id: &str) -> Result<Response<FullBody>> {
    let collaborator = find(state, user, id).await?;
    Ok(json_response(StatusCode::OK, &collaborator))
}

async fn update(
    req: &ApiRequest,
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<Response<FullBody>> {
    let patch: CollaboratorPatch = req.json()?;
    let mut collaborator = find(state, user, id).await?;
    collaborator.apply_patch(patch)?;
    state.repo.update_collaborator(&collaborator).await?;

    Ok(json_response(StatusCode::OK, &collaborator))
}

async fn delete(state: &AppState, user: &AuthUser, id: &str) -> Result<Response<FullBody>> {
    if !state.repo.delete_collaborator(&user.user_id, id).await? {
        return Err(TrackerError::not_found("Collaborator not found"));
    }
    info!(collaborator_id = %id, "Collaborator deleted");
    Ok(empty_response(StatusCode::NO_CONTENT))
}

async fn find(state: &AppState, user: &AuthUser, id: &str) -> Result<Collaborator> {
    state
        .repo
        .get_collaborator(&user.user_id, id)
        .await?
        .ok_or_else(|| TrackerError::not_found("Collaborator not found"))
}
