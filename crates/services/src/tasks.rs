use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::{Comment, NotificationType, Task};
use tracing::info;

use crate::{
    access::{AccessService, Principal},
    dao::{
        base::{DaoError, DaoResult},
        notification::NewNotification,
        project::ProjectDao,
        status_request::StatusRequestDao,
        task::{NewTask, TaskDao, TaskFilter, TaskUpdate},
    },
    dispatch::Dispatcher,
};

pub struct TaskService {
    access: Arc<AccessService>,
    projects: Arc<ProjectDao>,
    tasks: Arc<TaskDao>,
    requests: Arc<StatusRequestDao>,
    dispatcher: Arc<Dispatcher>,
}

impl TaskService {
    pub fn new(
        access: Arc<AccessService>,
        projects: Arc<ProjectDao>,
        tasks: Arc<TaskDao>,
        requests: Arc<StatusRequestDao>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            access,
            projects,
            tasks,
            requests,
            dispatcher,
        }
    }

    /// `project_id` and `creator_id` of `new_task` are taken from the
    /// arguments, not trusted from the caller's payload.
    pub async fn create_task(
        &self,
        project_id: ObjectId,
        mut new_task: NewTask,
        principal: &Principal,
    ) -> DaoResult<Task> {
        self.access.assert_can_mutate(project_id, principal).await?;
        if new_task.title.trim().is_empty() {
            return Err(DaoError::Validation("title is required".to_string()));
        }

        new_task.project_id = project_id;
        new_task.creator_id = principal.user_id;
        let mut assignees: Vec<ObjectId> = new_task.assignee_id.into_iter().collect();
        assignees.extend(new_task.assignee_ids.iter().copied());
        self.ensure_members(project_id, &assignees).await?;

        let task = self.tasks.create(None, new_task).await?;
        info!(task_id = ?task.id, ?project_id, "Task created");

        self.notify_assigned(&task, &task.assigned_user_ids(), principal)
            .await;
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        project_id: ObjectId,
        principal: &Principal,
        filter: &TaskFilter,
    ) -> DaoResult<Vec<Task>> {
        self.access.assert_member(project_id, principal).await?;
        self.tasks.list(project_id, filter).await
    }

    pub async fn get_task(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<Task> {
        self.access.assert_member(project_id, principal).await?;
        self.tasks.base.find_by_id_in_project(project_id, task_id).await
    }

    pub async fn update_task(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        update: TaskUpdate,
        principal: &Principal,
    ) -> DaoResult<Task> {
        self.access.assert_can_mutate(project_id, principal).await?;
        let before = self
            .tasks
            .base
            .find_by_id_in_project(project_id, task_id)
            .await?;
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DaoError::Validation("title cannot be blank".to_string()));
        }

        let mut assignees: Vec<ObjectId> = update.assignee_id.flatten().into_iter().collect();
        if let Some(ids) = &update.assignee_ids {
            assignees.extend(ids.iter().copied());
        }
        self.ensure_members(project_id, &assignees).await?;

        if !update.is_empty() {
            self.tasks.update(task_id, update).await?;
        }
        let after = self.tasks.base.find_by_id(task_id).await?;

        let previously = before.assigned_user_ids();
        let newly_assigned: Vec<ObjectId> = after
            .assigned_user_ids()
            .into_iter()
            .filter(|id| !previously.contains(id))
            .collect();
        self.notify_assigned(&after, &newly_assigned, principal).await;

        Ok(after)
    }

    pub async fn delete_task(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<()> {
        self.access.assert_can_mutate(project_id, principal).await?;
        self.tasks
            .base
            .find_by_id_in_project(project_id, task_id)
            .await?;

        self.requests.delete_for_task(task_id).await?;
        self.tasks.delete(task_id).await?;
        info!(?task_id, ?project_id, "Task deleted");
        Ok(())
    }

    pub async fn add_comment(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        content: String,
        principal: &Principal,
    ) -> DaoResult<Comment> {
        self.access.assert_can_mutate(project_id, principal).await?;
        if content.trim().is_empty() {
            return Err(DaoError::Validation("content is required".to_string()));
        }
        self.tasks
            .base
            .find_by_id_in_project(project_id, task_id)
            .await?;
        self.tasks
            .add_comment(project_id, task_id, principal.user_id, content)
            .await
    }

    pub async fn list_comments(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<Vec<Comment>> {
        self.access.assert_member(project_id, principal).await?;
        self.tasks
            .base
            .find_by_id_in_project(project_id, task_id)
            .await?;
        self.tasks.list_comments(task_id).await
    }

    /// Authors may delete their own comments; project admins any comment.
    pub async fn delete_comment(
        &self,
        project_id: ObjectId,
        task_id: ObjectId,
        comment_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<()> {
        let role = self.access.assert_can_mutate(project_id, principal).await?;
        let comment = self
            .tasks
            .comments
            .find_by_id_in_project(project_id, comment_id)
            .await?;
        if comment.task_id != task_id {
            return Err(DaoError::NotFound);
        }
        if comment.author_id != principal.user_id && !role.is_admin() {
            return Err(DaoError::Forbidden(
                "Only the author or a project admin can delete this comment".to_string(),
            ));
        }
        self.tasks.delete_comment(comment_id).await?;
        Ok(())
    }

    async fn ensure_members(&self, project_id: ObjectId, user_ids: &[ObjectId]) -> DaoResult<()> {
        for user_id in user_ids {
            if self
                .projects
                .get_membership(project_id, *user_id)
                .await?
                .is_none()
            {
                return Err(DaoError::Validation(format!(
                    "assignee {} is not a member of this project",
                    user_id.to_hex()
                )));
            }
        }
        Ok(())
    }

    async fn notify_assigned(&self, task: &Task, recipients: &[ObjectId], actor: &Principal) {
        let recipients: Vec<ObjectId> = recipients
            .iter()
            .copied()
            .filter(|id| *id != actor.user_id)
            .collect();
        self.dispatcher
            .notify_many(&recipients, |user_id| NewNotification {
                user_id,
                notification_type: NotificationType::TaskAssigned,
                title: "Task assigned".to_string(),
                message: format!("You were assigned to \"{}\"", task.title),
                related_entity_id: task.id,
                action_url: task.id.map(|id| {
                    format!("/projects/{}/tasks/{}", task.project_id.to_hex(), id.to_hex())
                }),
            })
            .await;
    }
}
