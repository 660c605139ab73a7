use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_entity_id: Option<ObjectId>,
    pub action_url: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    StatusChangePending,
    StatusChangeApproved,
    StatusChangeRejected,
    TaskStatusChanged,
    TaskProposalPending,
    TaskProposalApproved,
    TaskProposalRejected,
    ProjectMemberAdded,
    ProjectMemberRemoved,
    ProjectRoleChanged,
    TaskAssigned,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}
