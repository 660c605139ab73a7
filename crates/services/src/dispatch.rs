use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dao::{
    base::DaoResult,
    chat::ChatDao,
    notification::{NewNotification, NotificationDao},
};

/// Destination for per-user notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: NewNotification) -> DaoResult<()>;
}

/// Destination for author-less messages in a project's chat.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn post_system_message(&self, project_id: ObjectId, text: &str) -> DaoResult<()>;
}

#[async_trait]
impl NotificationSink for NotificationDao {
    async fn notify(&self, notification: NewNotification) -> DaoResult<()> {
        self.create(notification).await.map(|_| ())
    }
}

#[async_trait]
impl ChatSink for ChatDao {
    async fn post_system_message(&self, project_id: ObjectId, text: &str) -> DaoResult<()> {
        self.create(project_id, None, text.to_string())
            .await
            .map(|_| ())
    }
}

/// Fans workflow events out to the sinks. Delivery is best-effort: sink
/// failures are logged here and never reach the caller.
pub struct Dispatcher {
    notifications: Arc<dyn NotificationSink>,
    chat: Arc<dyn ChatSink>,
}

impl Dispatcher {
    pub fn new(notifications: Arc<dyn NotificationSink>, chat: Arc<dyn ChatSink>) -> Self {
        Self {
            notifications,
            chat,
        }
    }

    pub async fn notify(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        let kind = notification.notification_type;
        match self.notifications.notify(notification).await {
            Ok(()) => debug!(?user_id, ?kind, "Notification stored"),
            Err(error) => warn!(?user_id, ?kind, %error, "Failed to store notification"),
        }
    }

    /// Sends one notification per recipient, built by `build`.
    pub async fn notify_many<F>(&self, recipients: &[ObjectId], build: F)
    where
        F: Fn(ObjectId) -> NewNotification,
    {
        for user_id in recipients {
            self.notify(build(*user_id)).await;
        }
    }

    pub async fn post_system_message(&self, project_id: ObjectId, text: &str) {
        if let Err(error) = self.chat.post_system_message(project_id, text).await {
            warn!(?project_id, %error, "Failed to post system message");
        }
    }
}
