use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::{ApprovalStatus, NotificationType, Task, TaskProposal};
use tracing::{info, warn};

use super::{approvals_url, ensure_pending, lost_race, require_reason, task_url};
use crate::{
    access::{AccessService, Principal},
    dao::{
        base::{DaoError, DaoResult},
        notification::NewNotification,
        project::ProjectDao,
        proposal::{ProposalDao, TaskDraft},
        task::{NewTask, TaskDao},
        user::UserDao,
    },
    dispatch::Dispatcher,
};

#[derive(Debug, Clone)]
pub enum ProposalOutcome {
    /// The caller is a project admin; the task exists already.
    Created(Task),
    /// The proposal is queued for admin review.
    Proposed(TaskProposal),
}

pub struct ProposalWorkflow {
    access: Arc<AccessService>,
    projects: Arc<ProjectDao>,
    tasks: Arc<TaskDao>,
    proposals: Arc<ProposalDao>,
    users: Arc<UserDao>,
    dispatcher: Arc<Dispatcher>,
}

impl ProposalWorkflow {
    pub fn new(
        access: Arc<AccessService>,
        projects: Arc<ProjectDao>,
        tasks: Arc<TaskDao>,
        proposals: Arc<ProposalDao>,
        users: Arc<UserDao>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            access,
            projects,
            tasks,
            proposals,
            users,
            dispatcher,
        }
    }

    pub async fn submit(
        &self,
        project_id: ObjectId,
        draft: TaskDraft,
        proposer: &Principal,
    ) -> DaoResult<ProposalOutcome> {
        if draft.title.trim().is_empty() {
            return Err(DaoError::Validation("title is required".to_string()));
        }

        let role = self.access.assert_can_mutate(project_id, proposer).await?;

        if role.is_admin() {
            let task = self
                .tasks
                .create(None, new_task_from(project_id, draft, proposer.user_id))
                .await?;
            info!(task_id = ?task.id, ?project_id, "Task created directly by admin");
            return Ok(ProposalOutcome::Created(task));
        }

        let proposal = self
            .proposals
            .create(project_id, draft, proposer.user_id)
            .await?;
        info!(proposal_id = ?proposal.id, ?project_id, "Task proposed");

        let proposer_name = self.users.display_name(proposer.user_id).await;
        match self.projects.admin_user_ids(project_id).await {
            Ok(admins) => {
                self.dispatcher
                    .notify_many(&admins, |admin_id| {
                        pending_notice(admin_id, &proposal, &proposer_name)
                    })
                    .await;
            }
            Err(error) => warn!(?project_id, %error, "Could not load project admins to notify"),
        }

        Ok(ProposalOutcome::Proposed(proposal))
    }

    /// Approves the proposal and materializes its task. The task id is
    /// allocated up front so it is recorded in the same write that resolves
    /// the proposal.
    pub async fn approve(
        &self,
        proposal_id: ObjectId,
        reviewer: &Principal,
    ) -> DaoResult<(TaskProposal, Task)> {
        let proposal = self.proposals.base.find_by_id(proposal_id).await?;
        self.access
            .assert_admin(proposal.project_id, reviewer)
            .await?;
        ensure_pending(proposal.status)?;

        let task_id = ObjectId::new();
        let resolved = self
            .proposals
            .resolve(
                proposal_id,
                ApprovalStatus::Approved,
                reviewer.user_id,
                None,
                Some(task_id),
            )
            .await?
            .ok_or_else(lost_race)?;

        let draft = TaskDraft {
            title: resolved.title.clone(),
            description: resolved.description.clone(),
            priority: resolved.priority,
            deadline: resolved.deadline,
        };
        let task = match self
            .tasks
            .create(
                Some(task_id),
                new_task_from(resolved.project_id, draft, resolved.proposed_by),
            )
            .await
        {
            Ok(task) => task,
            Err(error) => {
                warn!(?proposal_id, %error, "Task creation failed, reopening proposal");
                if let Err(reopen_error) = self.proposals.reopen(proposal_id, reviewer.user_id).await {
                    warn!(?proposal_id, error = %reopen_error, "Failed to reopen proposal");
                }
                return Err(error);
            }
        };
        info!(?proposal_id, ?task_id, "Task proposal approved");

        let reviewer_name = self.users.display_name(reviewer.user_id).await;
        self.dispatcher
            .notify(approved_notice(&resolved, task_id, &reviewer_name))
            .await;
        self.dispatcher
            .post_system_message(
                resolved.project_id,
                &format!(
                    "New task \"{}\" was added from a proposal (approved by {})",
                    task.title, reviewer_name
                ),
            )
            .await;

        Ok((resolved, task))
    }

    pub async fn reject(
        &self,
        proposal_id: ObjectId,
        reviewer: &Principal,
        reason: &str,
    ) -> DaoResult<TaskProposal> {
        let reason = require_reason(reason)?;

        let proposal = self.proposals.base.find_by_id(proposal_id).await?;
        self.access
            .assert_admin(proposal.project_id, reviewer)
            .await?;
        ensure_pending(proposal.status)?;

        let resolved = self
            .proposals
            .resolve(
                proposal_id,
                ApprovalStatus::Rejected,
                reviewer.user_id,
                Some(reason.clone()),
                None,
            )
            .await?
            .ok_or_else(lost_race)?;
        info!(?proposal_id, "Task proposal rejected");

        let reviewer_name = self.users.display_name(reviewer.user_id).await;
        self.dispatcher
            .notify(rejected_notice(&resolved, &reviewer_name, &reason))
            .await;

        Ok(resolved)
    }

    pub async fn list_pending_for_admin(&self, admin: &Principal) -> DaoResult<Vec<TaskProposal>> {
        let project_ids = self.access.admin_project_ids(admin).await?;
        self.proposals.list_pending_in_projects(&project_ids).await
    }

    pub async fn list_for_project(
        &self,
        project_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<Vec<TaskProposal>> {
        self.access.assert_member(project_id, principal).await?;
        self.proposals.list_by_project(project_id).await
    }
}

fn new_task_from(project_id: ObjectId, draft: TaskDraft, creator_id: ObjectId) -> NewTask {
    NewTask {
        project_id,
        title: draft.title,
        description: draft.description,
        priority: draft.priority,
        deadline: draft.deadline,
        creator_id,
        assignee_id: None,
        assignee_ids: Vec::new(),
    }
}

fn pending_notice(admin_id: ObjectId, proposal: &TaskProposal, proposer_name: &str) -> NewNotification {
    NewNotification {
        user_id: admin_id,
        notification_type: NotificationType::TaskProposalPending,
        title: "Task proposal awaiting approval".to_string(),
        message: format!("{} proposed a new task \"{}\"", proposer_name, proposal.title),
        related_entity_id: proposal.id,
        action_url: Some(approvals_url(proposal.project_id)),
    }
}

fn approved_notice(proposal: &TaskProposal, task_id: ObjectId, reviewer_name: &str) -> NewNotification {
    NewNotification {
        user_id: proposal.proposed_by,
        notification_type: NotificationType::TaskProposalApproved,
        title: "Task proposal approved".to_string(),
        message: format!(
            "{} approved your proposal \"{}\"",
            reviewer_name, proposal.title
        ),
        related_entity_id: Some(task_id),
        action_url: Some(task_url(proposal.project_id, task_id)),
    }
}

fn rejected_notice(proposal: &TaskProposal, reviewer_name: &str, reason: &str) -> NewNotification {
    NewNotification {
        user_id: proposal.proposed_by,
        notification_type: NotificationType::TaskProposalRejected,
        title: "Task proposal rejected".to_string(),
        message: format!(
            "{} rejected your proposal \"{}\": {}",
            reviewer_name, proposal.title, reason
        ),
        related_entity_id: proposal.id,
        action_url: Some(approvals_url(proposal.project_id)),
    }
}
