//! Admin-reviewed approval queues: status-change requests on existing tasks
//! and proposals for new ones. Both share the same three-state lifecycle.

pub mod proposal;
pub mod status_change;

pub use proposal::{ProposalOutcome, ProposalWorkflow};
pub use status_change::{StatusChangeOutcome, StatusChangeWorkflow};

use bson::oid::ObjectId;
use taskflow_db::models::ApprovalStatus;

use crate::dao::base::{DaoError, DaoResult};

/// Resolved requests are history; any further transition is refused.
pub fn ensure_pending(status: ApprovalStatus) -> DaoResult<()> {
    if status.is_terminal() {
        return Err(DaoError::InvalidState(format!(
            "Request already {}",
            status.as_str()
        )));
    }
    Ok(())
}

/// The reason must contain something besides whitespace; it is kept as typed.
pub fn require_reason(reason: &str) -> DaoResult<String> {
    if reason.trim().is_empty() {
        return Err(DaoError::Validation(
            "rejection reason is required".to_string(),
        ));
    }
    Ok(reason.to_string())
}

pub(crate) fn lost_race() -> DaoError {
    DaoError::InvalidState("Request was resolved concurrently".to_string())
}

pub(crate) fn task_url(project_id: ObjectId, task_id: ObjectId) -> String {
    format!("/projects/{}/tasks/{}", project_id.to_hex(), task_id.to_hex())
}

pub(crate) fn approvals_url(project_id: ObjectId) -> String {
    format!("/projects/{}/approvals", project_id.to_hex())
}
