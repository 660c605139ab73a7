use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taskflow_db::models::{Project, ProjectRole};
use validator::Validate;

use super::{hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: String,
    /// Caller's effective role, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_role: Option<ProjectRole>,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn to_response(project: Project, my_role: Option<ProjectRole>) -> ProjectResponse {
    ProjectResponse {
        id: hex(project.id),
        name: project.name,
        description: project.description,
        creator_id: project.creator_id.to_hex(),
        my_role,
        created_at: rfc3339(project.created_at),
        updated_at: rfc3339(project.updated_at),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state.membership.list_projects(&auth.principal).await?;
    Ok(Json(
        projects.into_iter().map(|p| to_response(p, None)).collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    body.validate()?;
    let project = state
        .membership
        .create_project(body.name, body.description, &auth.principal)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(to_response(project, Some(ProjectRole::Admin))),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let (project, role) = state.membership.get_project(pid, &auth.principal).await?;
    Ok(Json(to_response(project, Some(role))))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;
    let project = state
        .membership
        .update_project(pid, &auth.principal, body.name, body.description)
        .await?;
    Ok(Json(to_response(project, Some(ProjectRole::Admin))))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    state.membership.delete_project(pid, &auth.principal).await?;
    Ok(StatusCode::NO_CONTENT)
}
