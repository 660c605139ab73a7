use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::{ApprovalStatus, NotificationType, StatusChangeRequest, Task};
use tracing::{info, warn};

use super::{approvals_url, ensure_pending, lost_race, require_reason, task_url};
use crate::{
    access::{AccessService, Principal},
    dao::{
        base::{DaoError, DaoResult},
        notification::NewNotification,
        project::ProjectDao,
        status_request::StatusRequestDao,
        task::TaskDao,
        user::UserDao,
    },
    dispatch::Dispatcher,
};

/// What happened to a submitted status change.
#[derive(Debug, Clone)]
pub enum StatusChangeOutcome {
    /// The caller is a project admin; the task was updated immediately.
    Applied(Task),
    /// The change was queued for admin review.
    Requested(StatusChangeRequest),
}

pub struct StatusChangeWorkflow {
    access: Arc<AccessService>,
    projects: Arc<ProjectDao>,
    tasks: Arc<TaskDao>,
    requests: Arc<StatusRequestDao>,
    users: Arc<UserDao>,
    dispatcher: Arc<Dispatcher>,
}

impl StatusChangeWorkflow {
    pub fn new(
        access: Arc<AccessService>,
        projects: Arc<ProjectDao>,
        tasks: Arc<TaskDao>,
        requests: Arc<StatusRequestDao>,
        users: Arc<UserDao>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            access,
            projects,
            tasks,
            requests,
            users,
            dispatcher,
        }
    }

    pub async fn submit(
        &self,
        task_id: ObjectId,
        requested_status: &str,
        requester: &Principal,
    ) -> DaoResult<StatusChangeOutcome> {
        let requested_status = requested_status.trim();
        if requested_status.is_empty() {
            return Err(DaoError::Validation(
                "requested status is required".to_string(),
            ));
        }

        let task = self.tasks.base.find_by_id(task_id).await?;
        let role = self
            .access
            .assert_can_mutate(task.project_id, requester)
            .await?;

        if role.is_admin() {
            self.tasks.set_status(task_id, requested_status).await?;
            info!(?task_id, status = requested_status, "Task status set directly by admin");
            let updated = self.tasks.base.find_by_id(task_id).await?;

            let actor = self.users.display_name(requester.user_id).await;
            let recipients: Vec<ObjectId> = updated
                .assigned_user_ids()
                .into_iter()
                .filter(|id| *id != requester.user_id)
                .collect();
            self.dispatcher
                .notify_many(&recipients, |user_id| {
                    status_changed_notice(user_id, &updated, &actor)
                })
                .await;

            return Ok(StatusChangeOutcome::Applied(updated));
        }

        let request = self
            .requests
            .create(&task, requested_status, requester.user_id)
            .await?;
        info!(
            request_id = ?request.id,
            ?task_id,
            from = %request.current_status,
            to = %request.requested_status,
            "Status change requested"
        );

        let requester_name = self.users.display_name(requester.user_id).await;
        match self.projects.admin_user_ids(task.project_id).await {
            Ok(admins) => {
                self.dispatcher
                    .notify_many(&admins, |admin_id| {
                        pending_notice(admin_id, &request, &task.title, &requester_name)
                    })
                    .await;
            }
            Err(error) => warn!(?task_id, %error, "Could not load project admins to notify"),
        }

        Ok(StatusChangeOutcome::Requested(request))
    }

    pub async fn approve(
        &self,
        request_id: ObjectId,
        reviewer: &Principal,
    ) -> DaoResult<StatusChangeRequest> {
        let request = self.requests.base.find_by_id(request_id).await?;
        let task = self.tasks.base.find_by_id(request.task_id).await?;
        self.access.assert_admin(task.project_id, reviewer).await?;
        ensure_pending(request.status)?;

        let resolved = self
            .requests
            .resolve(request_id, ApprovalStatus::Approved, reviewer.user_id, None)
            .await?
            .ok_or_else(lost_race)?;

        let applied = self
            .tasks
            .set_status(request.task_id, &request.requested_status)
            .await;
        if let Err(error) = task_written(applied) {
            warn!(?request_id, %error, "Task update failed, reopening request");
            if let Err(reopen_error) = self.requests.reopen(request_id, reviewer.user_id).await {
                warn!(?request_id, error = %reopen_error, "Failed to reopen request");
            }
            return Err(error);
        }
        info!(?request_id, task_id = ?request.task_id, status = %request.requested_status, "Status change approved");

        let reviewer_name = self.users.display_name(reviewer.user_id).await;
        let mut updated = task;
        updated.status = request.requested_status.clone();

        self.dispatcher
            .notify(approved_notice(&resolved, &updated.title, &reviewer_name))
            .await;

        let others: Vec<ObjectId> = updated
            .assigned_user_ids()
            .into_iter()
            .filter(|id| *id != resolved.requested_by)
            .collect();
        self.dispatcher
            .notify_many(&others, |user_id| {
                status_changed_notice(user_id, &updated, &reviewer_name)
            })
            .await;

        self.dispatcher
            .post_system_message(
                updated.project_id,
                &format!(
                    "Task \"{}\" moved from {} to {} (approved by {})",
                    updated.title, resolved.current_status, resolved.requested_status, reviewer_name
                ),
            )
            .await;

        Ok(resolved)
    }

    pub async fn reject(
        &self,
        request_id: ObjectId,
        reviewer: &Principal,
        reason: &str,
    ) -> DaoResult<StatusChangeRequest> {
        let reason = require_reason(reason)?;

        let request = self.requests.base.find_by_id(request_id).await?;
        let task = self.tasks.base.find_by_id(request.task_id).await?;
        self.access.assert_admin(task.project_id, reviewer).await?;
        ensure_pending(request.status)?;

        let resolved = self
            .requests
            .resolve(
                request_id,
                ApprovalStatus::Rejected,
                reviewer.user_id,
                Some(reason.clone()),
            )
            .await?
            .ok_or_else(lost_race)?;
        info!(?request_id, task_id = ?request.task_id, "Status change rejected");

        let reviewer_name = self.users.display_name(reviewer.user_id).await;
        self.dispatcher
            .notify(rejected_notice(&resolved, &task.title, &reviewer_name, &reason))
            .await;

        Ok(resolved)
    }

    /// Pending requests across every project the caller administers,
    /// oldest first.
    pub async fn list_pending_for_admin(
        &self,
        admin: &Principal,
    ) -> DaoResult<Vec<StatusChangeRequest>> {
        let project_ids = self.access.admin_project_ids(admin).await?;
        self.requests.list_pending_in_projects(&project_ids).await
    }

    pub async fn list_by_task(
        &self,
        task_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<Vec<StatusChangeRequest>> {
        let task = self.tasks.base.find_by_id(task_id).await?;
        self.access.assert_member(task.project_id, principal).await?;
        self.requests.list_by_task(task_id).await
    }
}

/// A status write that matched no task means the task was deleted after the
/// request was claimed.
fn task_written(result: DaoResult<bool>) -> DaoResult<()> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err(DaoError::NotFound),
        Err(error) => Err(error),
    }
}

fn pending_notice(
    admin_id: ObjectId,
    request: &StatusChangeRequest,
    task_title: &str,
    requester_name: &str,
) -> NewNotification {
    NewNotification {
        user_id: admin_id,
        notification_type: NotificationType::StatusChangePending,
        title: "Status change awaiting approval".to_string(),
        message: format!(
            "{} asked to move \"{}\" from {} to {}",
            requester_name, task_title, request.current_status, request.requested_status
        ),
        related_entity_id: request.id,
        action_url: Some(approvals_url(request.project_id)),
    }
}

fn approved_notice(
    request: &StatusChangeRequest,
    task_title: &str,
    reviewer_name: &str,
) -> NewNotification {
    NewNotification {
        user_id: request.requested_by,
        notification_type: NotificationType::StatusChangeApproved,
        title: "Status change approved".to_string(),
        message: format!(
            "{} approved moving \"{}\" to {}",
            reviewer_name, task_title, request.requested_status
        ),
        related_entity_id: request.id,
        action_url: Some(task_url(request.project_id, request.task_id)),
    }
}

fn rejected_notice(
    request: &StatusChangeRequest,
    task_title: &str,
    reviewer_name: &str,
    reason: &str,
) -> NewNotification {
    NewNotification {
        user_id: request.requested_by,
        notification_type: NotificationType::StatusChangeRejected,
        title: "Status change rejected".to_string(),
        message: format!(
            "{} rejected moving \"{}\" to {}: {}",
            reviewer_name, task_title, request.requested_status, reason
        ),
        related_entity_id: request.id,
        action_url: Some(task_url(request.project_id, request.task_id)),
    }
}

fn status_changed_notice(user_id: ObjectId, task: &Task, actor_name: &str) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: NotificationType::TaskStatusChanged,
        title: "Task status changed".to_string(),
        message: format!(
            "\"{}\" is now {} (changed by {})",
            task.title, task.status, actor_name
        ),
        related_entity_id: task.id,
        action_url: task.id.map(|id| task_url(task.project_id, id)),
    }
}
