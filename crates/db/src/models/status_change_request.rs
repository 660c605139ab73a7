use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::approval::ApprovalStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub task_id: ObjectId,
    pub project_id: ObjectId,
    /// Task status at the time the request was made.
    pub current_status: String,
    pub requested_status: String,
    pub requested_by: ObjectId,
    #[serde(default)]
    pub status: ApprovalStatus,
    pub reviewed_by: Option<ObjectId>,
    pub reviewed_at: Option<DateTime>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl StatusChangeRequest {
    pub const COLLECTION: &'static str = "status_change_requests";
}
