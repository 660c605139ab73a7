use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use taskflow_db::models::SystemRole;
use taskflow_services::dao::base::{PaginatedResult, PaginationParams};

use super::{auth::UserResponse, parse_id};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub is_active: Option<bool>,
    pub system_role: Option<SystemRole>,
}

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<UserResponse>>, ApiError> {
    let page = state
        .user_admin
        .list_users(&auth.principal, &params)
        .await?;
    Ok(Json(page.map(UserResponse::from)))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state
        .user_admin
        .update_user(&auth.principal, uid, body.is_active, body.system_role)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    state.user_admin.delete_user(&auth.principal, uid).await?;
    Ok(StatusCode::NO_CONTENT)
}
