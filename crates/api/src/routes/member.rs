use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskflow_db::models::{ProjectMember, ProjectRole};

use super::{hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub role: Option<ProjectRole>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: ProjectRole,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub role: ProjectRole,
    pub added_by: Option<String>,
    pub joined_at: String,
}

fn to_response(member: ProjectMember, names: &HashMap<String, (String, String)>) -> MemberResponse {
    let user_id = member.user_id.to_hex();
    let (display_name, username) = match names.get(&user_id) {
        Some((display, username)) => (Some(display.clone()), Some(username.clone())),
        None => (None, None),
    };
    MemberResponse {
        id: hex(member.id),
        project_id: member.project_id.to_hex(),
        user_id,
        display_name,
        username,
        role: member.role,
        added_by: member.added_by.map(|id| id.to_hex()),
        joined_at: rfc3339(member.joined_at),
    }
}

async fn user_names(
    state: &AppState,
    members: &[ProjectMember],
) -> Result<HashMap<String, (String, String)>, ApiError> {
    let ids: Vec<_> = members.iter().map(|m| m.user_id).collect();
    let users = state.users.find_many_by_ids(&ids).await?;
    Ok(users
        .into_iter()
        .map(|u| (hex(u.id), (u.display_name, u.username)))
        .collect())
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Query(query): Query<MemberQuery>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let members = state
        .membership
        .list_members(pid, &auth.principal, query.role)
        .await?;
    let names = user_names(&state, &members).await?;
    Ok(Json(
        members
            .into_iter()
            .map(|m| to_response(m, &names))
            .collect(),
    ))
}

pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let uid = parse_id(&body.user_id, "user_id")?;
    let member = state
        .membership
        .add_member(pid, &auth.principal, uid, body.role)
        .await?;
    let names = user_names(&state, std::slice::from_ref(&member)).await?;
    Ok((StatusCode::CREATED, Json(to_response(member, &names))))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(String, String)>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let uid = parse_id(&user_id, "user_id")?;
    let member = state
        .membership
        .change_member_role(pid, &auth.principal, uid, body.role)
        .await?;
    let names = user_names(&state, std::slice::from_ref(&member)).await?;
    Ok(Json(to_response(member, &names)))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let uid = parse_id(&user_id, "user_id")?;
    state
        .membership
        .remove_member(pid, &auth.principal, uid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
