use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use taskflow_db::models::{ApprovalStatus, StatusChangeRequest, Task};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct StatusRequestDao {
    pub base: BaseDao<StatusChangeRequest>,
}

impl StatusRequestDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, StatusChangeRequest::COLLECTION),
        }
    }

    /// Records a pending request, snapshotting the task's current status.
    pub async fn create(
        &self,
        task: &Task,
        requested_status: &str,
        requested_by: ObjectId,
    ) -> DaoResult<StatusChangeRequest> {
        let task_id = task.id.ok_or(DaoError::NotFound)?;
        let now = DateTime::now();
        let request = StatusChangeRequest {
            id: None,
            task_id,
            project_id: task.project_id,
            current_status: task.status.clone(),
            requested_status: requested_status.to_string(),
            requested_by,
            status: ApprovalStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&request).await?;
        self.base.find_by_id(id).await
    }

    /// Moves a request out of `PENDING`. The filter on the pending status makes
    /// this the single point where concurrent reviewers are serialized:
    /// `None` means someone else resolved it first.
    pub async fn resolve(
        &self,
        request_id: ObjectId,
        outcome: ApprovalStatus,
        reviewer: ObjectId,
        rejection_reason: Option<String>,
    ) -> DaoResult<Option<StatusChangeRequest>> {
        self.base
            .find_one_and_update(
                doc! { "_id": request_id, "status": ApprovalStatus::Pending.as_str() },
                doc! { "$set": {
                    "status": outcome.as_str(),
                    "reviewed_by": reviewer,
                    "reviewed_at": DateTime::now(),
                    "rejection_reason": rejection_reason,
                } },
            )
            .await
    }

    /// Undoes [`resolve`](Self::resolve) when the follow-up write failed.
    pub async fn reopen(&self, request_id: ObjectId, reviewer: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! {
                    "_id": request_id,
                    "reviewed_by": reviewer,
                    "status": { "$ne": ApprovalStatus::Pending.as_str() },
                },
                doc! { "$set": {
                    "status": ApprovalStatus::Pending.as_str(),
                    "reviewed_by": null,
                    "reviewed_at": null,
                    "rejection_reason": null,
                } },
            )
            .await
    }

    pub async fn list_pending_in_projects(
        &self,
        project_ids: &[ObjectId],
    ) -> DaoResult<Vec<StatusChangeRequest>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(
                doc! {
                    "project_id": { "$in": project_ids.to_vec() },
                    "status": ApprovalStatus::Pending.as_str(),
                },
                Some(doc! { "created_at": 1, "_id": 1 }),
            )
            .await
    }

    pub async fn count_pending_in_projects(&self, project_ids: &[ObjectId]) -> DaoResult<u64> {
        if project_ids.is_empty() {
            return Ok(0);
        }
        self.base
            .count(doc! {
                "project_id": { "$in": project_ids.to_vec() },
                "status": ApprovalStatus::Pending.as_str(),
            })
            .await
    }

    pub async fn list_by_task(&self, task_id: ObjectId) -> DaoResult<Vec<StatusChangeRequest>> {
        self.base
            .find_many(
                doc! { "task_id": task_id },
                Some(doc! { "created_at": 1, "_id": 1 }),
            )
            .await
    }

    pub async fn delete_for_task(&self, task_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "task_id": task_id }).await
    }
}
