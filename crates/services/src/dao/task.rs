use bson::{doc, oid::ObjectId, DateTime, Document};
use futures::TryStreamExt;
use mongodb::Database;
use taskflow_db::models::{Comment, Task, TaskPriority, TaskStatus};

use super::base::{BaseDao, DaoResult};

pub struct TaskDao {
    pub base: BaseDao<Task>,
    pub comments: BaseDao<Comment>,
}

/// Fields a caller supplies when a task is created.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime>,
    pub creator_id: ObjectId,
    pub assignee_id: Option<ObjectId>,
    pub assignee_ids: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub assignee_id: Option<ObjectId>,
}

/// Editable task fields. Status is deliberately absent; it only moves
/// through the status-change workflow.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub deadline: Option<DateTime>,
    pub assignee_id: Option<Option<ObjectId>>,
    pub assignee_ids: Option<Vec<ObjectId>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.assignee_id.is_none()
            && self.assignee_ids.is_none()
    }
}

impl TaskDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Task::COLLECTION),
            comments: BaseDao::new(db, Comment::COLLECTION),
        }
    }

    /// Inserts a task in `NEW` status. A pre-allocated `id` may be supplied
    /// so callers can reference the task before it exists.
    pub async fn create(&self, id: Option<ObjectId>, new_task: NewTask) -> DaoResult<Task> {
        let now = DateTime::now();
        let task = Task {
            id,
            project_id: new_task.project_id,
            title: new_task.title,
            description: new_task.description,
            status: TaskStatus::New.as_str().to_string(),
            priority: new_task.priority,
            deadline: new_task.deadline,
            creator_id: new_task.creator_id,
            assignee_id: new_task.assignee_id,
            assignee_ids: new_task.assignee_ids,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&task).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self, project_id: ObjectId, filter: &TaskFilter) -> DaoResult<Vec<Task>> {
        let mut query = doc! { "project_id": project_id };
        if let Some(status) = &filter.status {
            query.insert("status", status.as_str());
        }
        if let Some(assignee) = filter.assignee_id {
            query.insert(
                "$or",
                vec![
                    doc! { "assignee_id": assignee },
                    doc! { "assignee_ids": assignee },
                ],
            );
        }
        self.base
            .find_many(query, Some(doc! { "created_at": -1 }))
            .await
    }

    pub async fn set_status(&self, task_id: ObjectId, status: &str) -> DaoResult<bool> {
        self.base
            .update_by_id(task_id, doc! { "$set": { "status": status } })
            .await
    }

    pub async fn update(&self, task_id: ObjectId, update: TaskUpdate) -> DaoResult<bool> {
        let mut set = Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(priority) = update.priority {
            set.insert("priority", bson::to_bson(&priority)?);
        }
        if let Some(deadline) = update.deadline {
            set.insert("deadline", deadline);
        }
        if let Some(assignee_id) = update.assignee_id {
            set.insert("assignee_id", assignee_id);
        }
        if let Some(assignee_ids) = update.assignee_ids {
            set.insert("assignee_ids", assignee_ids);
        }

        if set.is_empty() {
            return Ok(false);
        }

        self.base.update_by_id(task_id, doc! { "$set": set }).await
    }

    pub async fn delete(&self, task_id: ObjectId) -> DaoResult<bool> {
        self.comments.hard_delete(doc! { "task_id": task_id }).await?;
        let deleted = self.base.hard_delete(doc! { "_id": task_id }).await?;
        Ok(deleted > 0)
    }

    /// Drops `user_id` from every assignment in the project. Returns the
    /// number of tasks touched.
    pub async fn unassign_in_project(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<u64> {
        let single = self
            .base
            .update_many(
                doc! { "project_id": project_id, "assignee_id": user_id },
                doc! { "$set": { "assignee_id": bson::Bson::Null } },
            )
            .await?;
        let multi = self
            .base
            .update_many(
                doc! { "project_id": project_id, "assignee_ids": user_id },
                doc! { "$pull": { "assignee_ids": user_id } },
            )
            .await?;
        Ok(single + multi)
    }

    /// Counts tasks assigned to `user_id` (single or multi assignment) within
    /// `project_ids`, keyed by status.
    pub async fn count_assigned_by_status(
        &self,
        user_id: ObjectId,
        project_ids: &[ObjectId],
    ) -> DaoResult<Vec<(String, u64)>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let pipeline = assigned_by_status_pipeline(user_id, project_ids);
        let mut cursor = self.base.collection().aggregate(pipeline).await?;
        let mut counts = Vec::new();
        while let Some(row) = cursor.try_next().await? {
            let status = row.get_str("_id").unwrap_or_default().to_string();
            let count = match row.get("count") {
                Some(bson::Bson::Int32(n)) => *n as u64,
                Some(bson::Bson::Int64(n)) => *n as u64,
                _ => 0,
            };
            counts.push((status, count));
        }
        Ok(counts)
    }

    pub async fn add_comment(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        author_id: ObjectId,
        content: String,
    ) -> DaoResult<Comment> {
        let now = DateTime::now();
        let comment = Comment {
            id: None,
            project_id,
            task_id,
            author_id,
            content,
            created_at: now,
            updated_at: now,
        };

        let id = self.comments.insert_one(&comment).await?;
        self.comments.find_by_id(id).await
    }

    pub async fn list_comments(&self, task_id: ObjectId) -> DaoResult<Vec<Comment>> {
        self.comments
            .find_many(doc! { "task_id": task_id }, Some(doc! { "created_at": 1 }))
            .await
    }

    pub async fn delete_comment(&self, comment_id: ObjectId) -> DaoResult<bool> {
        let deleted = self.comments.hard_delete(doc! { "_id": comment_id }).await?;
        Ok(deleted > 0)
    }
}

fn assigned_by_status_pipeline(user_id: ObjectId, project_ids: &[ObjectId]) -> Vec<Document> {
    vec![
        doc! { "$match": {
            "project_id": { "$in": project_ids.to_vec() },
            "$or": [
                { "assignee_id": user_id },
                { "assignee_ids": user_id },
            ],
        } },
        doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}
