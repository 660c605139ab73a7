use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskflow_db::models::{ApprovalStatus, TaskPriority, TaskProposal};
use taskflow_services::{dao::proposal::TaskDraft, workflow::ProposalOutcome};
use validator::Validate;

use super::{
    from_chrono, hex, parse_id, rfc3339,
    status_request::RejectRequest,
    task::{self, TaskResponse},
};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct ProposeTaskRequest {
    #[validate(length(min = 1, max = 300, message = "must be 1 to 300 characters"))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: Option<String>,
    pub proposed_by: String,
    pub status: ApprovalStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_task_id: Option<String>,
    pub created_at: String,
}

fn to_response(proposal: TaskProposal) -> ProposalResponse {
    ProposalResponse {
        id: hex(proposal.id),
        project_id: proposal.project_id.to_hex(),
        title: proposal.title,
        description: proposal.description,
        priority: proposal.priority,
        deadline: proposal.deadline.map(rfc3339),
        proposed_by: proposal.proposed_by.to_hex(),
        status: proposal.status,
        reviewed_by: proposal.reviewed_by.map(|id| id.to_hex()),
        reviewed_at: proposal.reviewed_at.map(rfc3339),
        rejection_reason: proposal.rejection_reason,
        created_task_id: proposal.created_task_id.map(|id| id.to_hex()),
        created_at: rfc3339(proposal.created_at),
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProposeResponse {
    Created { task: TaskResponse },
    Proposed { proposal: ProposalResponse },
}

#[derive(Debug, Serialize)]
pub struct ApprovedProposalResponse {
    pub proposal: ProposalResponse,
    pub task: TaskResponse,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<ProposalResponse>>, ApiError> {
    let pid = parse_id(&project_id, "project_id")?;
    let proposals = state
        .proposals
        .list_for_project(pid, &auth.principal)
        .await?;
    Ok(Json(proposals.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<ProposeTaskRequest>,
) -> Result<(StatusCode, Json<ProposeResponse>), ApiError> {
    body.validate()?;
    let pid = parse_id(&project_id, "project_id")?;
    let draft = TaskDraft {
        title: body.title,
        description: body.description,
        priority: body.priority,
        deadline: body.deadline.map(from_chrono),
    };

    let response = match state.proposals.submit(pid, draft, &auth.principal).await? {
        ProposalOutcome::Created(created) => ProposeResponse::Created {
            task: task::to_response(created),
        },
        ProposalOutcome::Proposed(proposal) => ProposeResponse::Proposed {
            proposal: to_response(proposal),
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ProposalResponse>>, ApiError> {
    let proposals = state
        .proposals
        .list_pending_for_admin(&auth.principal)
        .await?;
    Ok(Json(proposals.into_iter().map(to_response).collect()))
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(proposal_id): Path<String>,
) -> Result<Json<ApprovedProposalResponse>, ApiError> {
    let id = parse_id(&proposal_id, "proposal_id")?;
    let (proposal, created) = state.proposals.approve(id, &auth.principal).await?;
    Ok(Json(ApprovedProposalResponse {
        proposal: to_response(proposal),
        task: task::to_response(created),
    }))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(proposal_id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<ProposalResponse>, ApiError> {
    let id = parse_id(&proposal_id, "proposal_id")?;
    let proposal = state
        .proposals
        .reject(id, &auth.principal, &body.reason)
        .await?;
    Ok(Json(to_response(proposal)))
}
