use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::ChatMessage;

use crate::{
    access::{AccessService, Principal},
    dao::{
        base::{DaoError, DaoResult, PaginatedResult, PaginationParams},
        chat::ChatDao,
    },
};

/// Human-authored project chat. System messages arrive through
/// [`Dispatcher`](crate::dispatch::Dispatcher).
pub struct ChatService {
    access: Arc<AccessService>,
    chat: Arc<ChatDao>,
}

impl ChatService {
    pub fn new(access: Arc<AccessService>, chat: Arc<ChatDao>) -> Self {
        Self { access, chat }
    }

    pub async fn send_message(
        &self,
        project_id: ObjectId,
        principal: &Principal,
        content: String,
    ) -> DaoResult<ChatMessage> {
        self.access.assert_can_mutate(project_id, principal).await?;
        if content.trim().is_empty() {
            return Err(DaoError::Validation("content is required".to_string()));
        }
        self.chat
            .create(project_id, Some(principal.user_id), content)
            .await
    }

    pub async fn list_messages(
        &self,
        project_id: ObjectId,
        principal: &Principal,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<ChatMessage>> {
        self.access.assert_member(project_id, principal).await?;
        self.chat.find_in_project(project_id, params).await
    }
}
