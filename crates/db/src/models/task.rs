use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    /// Stored as free text. The enumerated values live in [`TaskStatus`] and
    /// are enforced where requests enter the system.
    pub status: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: Option<DateTime>,
    pub creator_id: ObjectId,
    pub assignee_id: Option<ObjectId>,
    #[serde(default)]
    pub assignee_ids: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Task {
    pub const COLLECTION: &'static str = "tasks";

    /// Union of the single assignee and the assignee set, without duplicates.
    pub fn assigned_user_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = Vec::with_capacity(self.assignee_ids.len() + 1);
        for id in self.assignee_id.iter().chain(self.assignee_ids.iter()) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::New,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "NEW",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}
