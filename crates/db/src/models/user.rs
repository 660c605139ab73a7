use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub system_role: SystemRole,
    #[serde(default = "bool_true")]
    pub is_active: bool,
    pub last_login_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Installation-wide role. A super-admin acts as a project admin everywhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    #[default]
    User,
    SuperAdmin,
}

impl SystemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::User => "USER",
            SystemRole::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

fn bool_true() -> bool {
    true
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn is_super_admin(&self) -> bool {
        self.system_role == SystemRole::SuperAdmin
    }
}
