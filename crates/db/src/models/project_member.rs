use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub user_id: ObjectId,
    pub role: ProjectRole,
    pub added_by: Option<ObjectId>,
    pub joined_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
    Admin,
    Member,
    Viewer,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "ADMIN",
            ProjectRole::Member => "MEMBER",
            ProjectRole::Viewer => "VIEWER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ProjectRole::Admin)
    }

    /// Viewers are read-only; everyone else may create and edit.
    pub fn can_mutate(&self) -> bool {
        matches!(self, ProjectRole::Admin | ProjectRole::Member)
    }
}

impl ProjectMember {
    pub const COLLECTION: &'static str = "project_members";
}
