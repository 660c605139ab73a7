use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taskflow_db::models::{Notification, NotificationType};
use taskflow_services::dao::base::{PaginatedResult, PaginationParams};

use super::{hex, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl NotificationQuery {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_entity_id: Option<String>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

fn to_response(n: Notification) -> NotificationResponse {
    NotificationResponse {
        id: hex(n.id),
        notification_type: n.notification_type,
        title: n.title,
        message: n.message,
        related_entity_id: n.related_entity_id.map(|id| id.to_hex()),
        action_url: n.action_url,
        is_read: n.is_read,
        read_at: n.read_at.map(rfc3339),
        created_at: rfc3339(n.created_at),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<PaginatedResult<NotificationResponse>>, ApiError> {
    let page = state
        .notifications
        .list_for_user(auth.user_id, query.unread_only, &query.pagination())
        .await?;
    Ok(Json(page.map(to_response)))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.notifications.unread_count(auth.user_id).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let nid = parse_id(&notification_id, "notification_id")?;
    state.notifications.mark_as_read(nid, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.notifications.mark_all_as_read(auth.user_id).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let nid = parse_id(&notification_id, "notification_id")?;
    state.notifications.delete(nid, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
