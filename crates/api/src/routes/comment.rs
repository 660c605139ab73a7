use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taskflow_db::models::Comment;
use validator::Validate;

use super::{hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000, message = "must be 1 to 10000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub task_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
}

fn to_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: hex(comment.id),
        task_id: comment.task_id.to_hex(),
        author_id: comment.author_id.to_hex(),
        content: comment.content,
        created_at: rfc3339(comment.created_at),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    let comments = state
        .tasks
        .list_comments(pid, tid, &auth.principal)
        .await?;
    Ok(Json(comments.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    let comment = state
        .tasks
        .add_comment(pid, tid, body.content, &auth.principal)
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(comment))))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id, comment_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    let cid = parse_id(&comment_id, "comment_id")?;
    state
        .tasks
        .delete_comment(pid, tid, cid, &auth.principal)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
