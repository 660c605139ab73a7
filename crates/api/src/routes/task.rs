use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use taskflow_db::models::{Task, TaskPriority, TaskStatus};
use taskflow_services::{
    dao::task::{NewTask, TaskFilter, TaskUpdate},
    workflow::StatusChangeOutcome,
};
use validator::Validate;

use super::{
    from_chrono, hex, known_status, parse_id, parse_ids, rfc3339,
    status_request::{self, StatusRequestResponse},
};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub assignee_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 300, message = "must be 1 to 300 characters"))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: Option<chrono::DateTime<Utc>>,
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub assignee_ids: Vec<String>,
}

/// `assignee_id: null` clears the primary assignee; omitting it leaves it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 300, message = "must be 1 to 300 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub deadline: Option<chrono::DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<String>>,
    pub assignee_ids: Option<Vec<String>>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    #[validate(custom(function = "known_status"))]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: TaskPriority,
    pub deadline: Option<String>,
    pub creator_id: String,
    pub assignee_id: Option<String>,
    pub assignee_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn to_response(task: Task) -> TaskResponse {
    TaskResponse {
        id: hex(task.id),
        project_id: task.project_id.to_hex(),
        title: task.title,
        description: task.description,
        status: task.status,
        priority: task.priority,
        deadline: task.deadline.map(rfc3339),
        creator_id: task.creator_id.to_hex(),
        assignee_id: task.assignee_id.map(|id| id.to_hex()),
        assignee_ids: task.assignee_ids.iter().map(|id| id.to_hex()).collect(),
        created_at: rfc3339(task.created_at),
        updated_at: rfc3339(task.updated_at),
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatusChangeResponse {
    Applied { task: TaskResponse },
    Requested { request: StatusRequestResponse },
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    if let Some(status) = query.status.as_deref() {
        if TaskStatus::parse(status).is_none() {
            return Err(ApiError::Validation(format!(
                "status: unknown status {status}"
            )));
        }
    }
    let filter = TaskFilter {
        status: query.status,
        assignee_id: query
            .assignee_id
            .as_deref()
            .map(|id| parse_id(id, "assignee_id"))
            .transpose()?,
    };

    let tasks = state
        .tasks
        .list_tasks(pid, &auth.principal, &filter)
        .await?;
    Ok(Json(tasks.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;

    let new_task = NewTask {
        project_id: pid,
        title: body.title,
        description: body.description,
        priority: body.priority,
        deadline: body.deadline.map(from_chrono),
        creator_id: auth.user_id,
        assignee_id: body
            .assignee_id
            .as_deref()
            .map(|id| parse_id(id, "assignee_id"))
            .transpose()?,
        assignee_ids: parse_ids(&body.assignee_ids, "assignee_ids")?,
    };

    let task = state
        .tasks
        .create_task(pid, new_task, &auth.principal)
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(task))))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<Json<TaskResponse>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    let task = state.tasks.get_task(pid, tid, &auth.principal).await?;
    Ok(Json(to_response(task)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;

    let assignee_id = match body.assignee_id {
        Some(Some(id)) => Some(Some(parse_id(&id, "assignee_id")?)),
        Some(None) => Some(None),
        None => None,
    };
    let assignee_ids = body
        .assignee_ids
        .as_deref()
        .map(|ids| parse_ids(ids, "assignee_ids"))
        .transpose()?;

    let update = TaskUpdate {
        title: body.title,
        description: body.description,
        priority: body.priority,
        deadline: body.deadline.map(from_chrono),
        assignee_id,
        assignee_ids,
    };
    let task = state
        .tasks
        .update_task(pid, tid, update, &auth.principal)
        .await?;
    Ok(Json(to_response(task)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    state.tasks.delete_task(pid, tid, &auth.principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admins change the status directly (200); everyone else files a request
/// for admin review (201).
pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<(StatusCode, Json<StatusChangeResponse>), ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    // Confirms the task lives in this project before touching it.
    state.tasks.get_task(pid, tid, &auth.principal).await?;

    let outcome = state
        .status_changes
        .submit(tid, &body.status, &auth.principal)
        .await?;
    Ok(match outcome {
        StatusChangeOutcome::Applied(task) => (
            StatusCode::OK,
            Json(StatusChangeResponse::Applied {
                task: to_response(task),
            }),
        ),
        StatusChangeOutcome::Requested(request) => (
            StatusCode::CREATED,
            Json(StatusChangeResponse::Requested {
                request: status_request::to_response(request),
            }),
        ),
    })
}

pub async fn status_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(String, String)>,
) -> Result<Json<Vec<StatusRequestResponse>>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let tid = parse_id(&task_id, "task_id")?;
    state.tasks.get_task(pid, tid, &auth.principal).await?;

    let requests = state
        .status_changes
        .list_by_task(tid, &auth.principal)
        .await?;
    Ok(Json(
        requests
            .into_iter()
            .map(status_request::to_response)
            .collect(),
    ))
}
