use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use taskflow_db::models::{ApprovalStatus, TaskPriority, TaskProposal};

use super::base::{BaseDao, DaoResult};

pub struct ProposalDao {
    pub base: BaseDao<TaskProposal>,
}

/// The task a proposer would like created.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime>,
}

impl ProposalDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, TaskProposal::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        draft: TaskDraft,
        proposed_by: ObjectId,
    ) -> DaoResult<TaskProposal> {
        let now = DateTime::now();
        let proposal = TaskProposal {
            id: None,
            project_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            deadline: draft.deadline,
            proposed_by,
            status: ApprovalStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_task_id: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&proposal).await?;
        self.base.find_by_id(id).await
    }

    /// Conditional move out of `PENDING`; `None` when already resolved.
    pub async fn resolve(
        &self,
        proposal_id: ObjectId,
        outcome: ApprovalStatus,
        reviewer: ObjectId,
        rejection_reason: Option<String>,
        created_task_id: Option<ObjectId>,
    ) -> DaoResult<Option<TaskProposal>> {
        self.base
            .find_one_and_update(
                doc! { "_id": proposal_id, "status": ApprovalStatus::Pending.as_str() },
                doc! { "$set": {
                    "status": outcome.as_str(),
                    "reviewed_by": reviewer,
                    "reviewed_at": DateTime::now(),
                    "rejection_reason": rejection_reason,
                    "created_task_id": created_task_id,
                } },
            )
            .await
    }

    pub async fn reopen(&self, proposal_id: ObjectId, reviewer: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! {
                    "_id": proposal_id,
                    "reviewed_by": reviewer,
                    "status": { "$ne": ApprovalStatus::Pending.as_str() },
                },
                doc! { "$set": {
                    "status": ApprovalStatus::Pending.as_str(),
                    "reviewed_by": null,
                    "reviewed_at": null,
                    "rejection_reason": null,
                    "created_task_id": null,
                } },
            )
            .await
    }

    pub async fn list_pending_in_projects(
        &self,
        project_ids: &[ObjectId],
    ) -> DaoResult<Vec<TaskProposal>> {
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

    pub async fn list_by_project(&self, project_id: ObjectId) -> DaoResult<Vec<TaskProposal>> {
        self.base
            .find_many(
                doc! { "project_id": project_id },
                Some(doc! { "created_at": 1, "_id": 1 }),
            )
            .await
    }
}
