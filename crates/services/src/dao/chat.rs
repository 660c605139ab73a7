use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use taskflow_db::models::ChatMessage;

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

pub struct ChatDao {
    pub base: BaseDao<ChatMessage>,
}

impl ChatDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ChatMessage::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        author_id: Option<ObjectId>,
        content: String,
    ) -> DaoResult<ChatMessage> {
        let message = ChatMessage {
            id: None,
            project_id,
            is_system: author_id.is_none(),
            author_id,
            content,
            created_at: DateTime::now(),
        };

        let id = self.base.insert_one(&message).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_in_project(
        &self,
        project_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<ChatMessage>> {
        self.base
            .find_paginated(
                doc! { "project_id": project_id },
                Some(doc! { "created_at": -1, "_id": -1 }),
                params,
            )
            .await
    }
}
