use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use taskflow_db::models::{ApprovalStatus, StatusChangeRequest};

use super::{hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

/// Body for rejecting a status request or a proposal. A missing reason is
/// treated like a blank one.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct StatusRequestResponse {
    pub id: String,
    pub task_id: String,
    pub project_id: String,
    pub current_status: String,
    pub requested_status: String,
    pub requested_by: String,
    pub status: ApprovalStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

pub(crate) fn to_response(request: StatusChangeRequest) -> StatusRequestResponse {
    StatusRequestResponse {
        id: hex(request.id),
        task_id: request.task_id.to_hex(),
        project_id: request.project_id.to_hex(),
        current_status: request.current_status,
        requested_status: request.requested_status,
        requested_by: request.requested_by.to_hex(),
        status: request.status,
        reviewed_by: request.reviewed_by.map(|id| id.to_hex()),
        reviewed_at: request.reviewed_at.map(rfc3339),
        rejection_reason: request.rejection_reason,
        created_at: rfc3339(request.created_at),
    }
}

pub async fn pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<StatusRequestResponse>>, ApiError> {
    let requests = state
        .status_changes
        .list_pending_for_admin(&auth.principal)
        .await?;
    Ok(Json(requests.into_iter().map(to_response).collect()))
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<StatusRequestResponse>, ApiError> {
    let rid = parse_id(&request_id, "request_id")?;
    let request = state.status_changes.approve(rid, &auth.principal).await?;
    Ok(Json(to_response(request)))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<StatusRequestResponse>, ApiError> {
    let rid = parse_id(&request_id, "request_id")?;
    let request = state
        .status_changes
        .reject(rid, &auth.principal, &body.reason)
        .await?;
    Ok(Json(to_response(request)))
}
