use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::{approval::ApprovalStatus, task::TaskPriority};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProposal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: Option<DateTime>,
    pub proposed_by: ObjectId,
    #[serde(default)]
    pub status: ApprovalStatus,
    pub reviewed_by: Option<ObjectId>,
    pub reviewed_at: Option<DateTime>,
    pub rejection_reason: Option<String>,
    pub created_task_id: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl TaskProposal {
    pub const COLLECTION: &'static str = "task_proposals";
}
