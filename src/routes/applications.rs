//! Application endpoints
//!
//! - `GET|POST /api/applications`
//! - `GET|PATCH|DELETE /api/applications/:id`
//! - `GET|POST /api/applications/:id/essays`
//! - `GET /api/applications/:id/collaborations`
//!
//! Applications are returned with `isPastDeadline` computed for today.

use chrono::Utc;
use hyper::{Method, Response, StatusCode};
use tracing::info;

use crate::auth::AuthUser;
use crate::model::{
    Application, ApplicationPatch, ApplicationView, CollaborationFilter, Essay, NewApplication,
    NewEssay,
};
use crate::routes::essays::EssayView;
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
        [id, "essays"] => match req.method {
            Method::GET => list_essays(state, user, id).await,
            Method::POST => create_essay(req, state, user, id).await,
            _ => Ok(method_not_allowed()),
        },
        [id, "collaborations"] => match req.method {
            Method::GET => list_collaborations(state, user, id).await,
            _ => Ok(method_not_allowed()),
        },
        _ => Err(route_not_found(req)),
    }
}

fn view(application: Application) -> ApplicationView {
    ApplicationView::new(application, Utc::now().date_naive())
}

async fn list(state: &AppState, user: &AuthUser) -> Result<Response<FullBody>> {
    let applications: Vec<ApplicationView> = state
        .repo
        .list_applications(&user.user_id)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(json_response(StatusCode::OK, &applications))
}

async fn create(req: &ApiRequest, state: &AppState, user: &AuthUser) -> Result<Response<FullBody>> {
    let input: NewApplication = req.json()?;
    let application = Application::create(&user.user_id, input)?;
    state.repo.insert_application(&application).await?;

    info!(application_id = %application.id, "Application created");
    Ok(json_response(StatusCode::CREATED, &view(application)))
}

async fn get(state: &AppState, user: &AuthUser, id: &str) -> Result<Response<FullBody>> {
    let application = find(state, user, id).await?;
    Ok(json_response(StatusCode::OK, &view(application)))
}

async fn update(
    req: &ApiRequest,
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<Response<FullBody>> {
    let patch: ApplicationPatch = req.json()?;
    let mut application = find(state, user, id).await?;
    application.apply_patch(patch)?;
    state.repo.update_application(&application).await?;

    Ok(json_response(StatusCode::OK, &view(application)))
}

async fn delete(state: &AppState, user: &AuthUser, id: &str) -> Result<Response<FullBody>> {
    if !state.repo.delete_application(&user.user_id, id).await? {
        return Err(TrackerError::not_found("Application not found"));
    }
    info!(application_id = %id, "Application deleted");
    Ok(empty_response(StatusCode::NO_CONTENT))
}

async fn list_essays(state: &AppState, user: &AuthUser, id: &str) -> Result<Response<FullBody>> {
    let application = find(state, user, id).await?;
    let essays: Vec<EssayView> = state
        .repo
        .list_essays(&user.user_id, &application.id)
        .await?
        .into_iter()
        .map(EssayView::from)
        .collect();
    Ok(json_response(StatusCode::OK, &essays))
}

async fn create_essay(
    req: &ApiRequest,
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<Response<FullBody>> {
    let input: NewEssay = req.json()?;
    let application = find(state, user, id).await?;
    let essay = Essay::create(&user.user_id, &application.id, input)?;
    state.repo.insert_essay(&essay).await?;

    info!(essay_id = %essay.id, application_id = %application.id, "Essay created");
    Ok(json_response(StatusCode::CREATED, &EssayView::from(essay)))
}

async fn list_collaborations(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<Response<FullBody>> {
    let application = find(state, user, id).await?;
    let collaborations = state
        .collaborations
        .list(&user.user_id, &CollaborationFilter::for_application(&application.id))
        .await?;
    Ok(json_response(StatusCode::OK, &collaborations))
}

async fn find(state: &AppState, user: &AuthUser, id: &str) -> Result<Application> {
    state
        .repo
        .get_application(&user.user_id, id)
        .await?
        .ok_or_else(|| TrackerError::not_found("Application not found"))
}
