use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taskflow_db::models::ChatMessage;
use taskflow_services::dao::base::{PaginatedResult, PaginationParams};
use validator::Validate;

use super::{hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "must be 1 to 4000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub project_id: String,
    pub author_id: Option<String>,
    pub is_system: bool,
    pub content: String,
    pub created_at: String,
}

fn to_response(message: ChatMessage) -> MessageResponse {
    MessageResponse {
        id: hex(message.id),
        project_id: message.project_id.to_hex(),
        author_id: message.author_id.map(|id| id.to_hex()),
        is_system: message.is_system,
        content: message.content,
        created_at: rfc3339(message.created_at),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<MessageResponse>>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let page = state
        .chat
        .list_messages(pid, &auth.principal, &params)
        .await?;
    Ok(Json(page.map(to_response)))
}

pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;
    let message = state
        .chat
        .send_message(pid, &auth.principal, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(message))))
}
