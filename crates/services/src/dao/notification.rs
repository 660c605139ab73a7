use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use taskflow_db::models::{Notification, NotificationType};

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

/// Everything needed to address and describe a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: ObjectId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_entity_id: Option<ObjectId>,
    pub action_url: Option<String>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn create(&self, new: NewNotification) -> DaoResult<Notification> {
        let notification = Notification {
            id: None,
            user_id: new.user_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            related_entity_id: new.related_entity_id,
            action_url: new.action_url,
            is_read: false,
            read_at: None,
            created_at: DateTime::now(),
        };

        let id = self.base.insert_one(&notification).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list_for_user(
        &self,
        user_id: ObjectId,
        unread_only: bool,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Notification>> {
        let mut filter = doc! { "user_id": user_id };
        if unread_only {
            filter.insert("is_read", false);
        }
        self.base
            .find_paginated(filter, Some(doc! { "created_at": -1, "_id": -1 }), params)
            .await
    }

    pub async fn unread_count(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! { "user_id": user_id, "is_read": false })
            .await
    }

    /// Marks one of the user's own notifications as read. Notifications of
    /// other users are reported as missing.
    pub async fn mark_as_read(&self, notification_id: ObjectId, user_id: ObjectId) -> DaoResult<()> {
        let changed = self
            .base
            .update_one(
                doc! { "_id": notification_id, "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await?;

        if changed {
            return Ok(());
        }

        let exists = self
            .base
            .count(doc! { "_id": notification_id, "user_id": user_id })
            .await?;
        if exists > 0 { Ok(()) } else { Err(DaoError::NotFound) }
    }

    pub async fn mark_all_as_read(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .update_many(
                doc! { "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await
    }

    pub async fn delete(&self, notification_id: ObjectId, user_id: ObjectId) -> DaoResult<()> {
        let deleted = self
            .base
            .hard_delete(doc! { "_id": notification_id, "user_id": user_id })
            .await?;
        if deleted > 0 { Ok(()) } else { Err(DaoError::NotFound) }
    }

    pub async fn delete_for_user(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "user_id": user_id }).await
    }
}
