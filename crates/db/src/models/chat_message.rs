use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A message in a project's chat stream. System messages have no author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub author_id: Option<ObjectId>,
    #[serde(default)]
    pub is_system: bool,
    pub content: String,
    pub created_at: DateTime,
}

impl ChatMessage {
    pub const COLLECTION: &'static str = "chat_messages";
}
