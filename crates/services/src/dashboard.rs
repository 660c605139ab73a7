use bson::oid::ObjectId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    access::{AccessService, Principal},
    dao::{
        base::DaoResult, notification::NotificationDao, proposal::ProposalDao,
        status_request::StatusRequestDao, task::TaskDao,
    },
    membership::MembershipService,
};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub project_count: usize,
    pub assigned_tasks_by_status: BTreeMap<String, u64>,
    pub pending_status_requests: u64,
    pub pending_proposals: u64,
    pub unread_notifications: u64,
}

pub struct DashboardService {
    access: Arc<AccessService>,
    membership: Arc<MembershipService>,
    tasks: Arc<TaskDao>,
    requests: Arc<StatusRequestDao>,
    proposals: Arc<ProposalDao>,
    notifications: Arc<NotificationDao>,
}

impl DashboardService {
    pub fn new(
        access: Arc<AccessService>,
        membership: Arc<MembershipService>,
        tasks: Arc<TaskDao>,
        requests: Arc<StatusRequestDao>,
        proposals: Arc<ProposalDao>,
        notifications: Arc<NotificationDao>,
    ) -> Self {
        Self {
            access,
            membership,
            tasks,
            requests,
            proposals,
            notifications,
        }
    }

    pub async fn summary(&self, principal: &Principal) -> DaoResult<DashboardSummary> {
        let projects = self.membership.list_projects(principal).await?;
        let admin_projects = self.access.admin_project_ids(principal).await?;
        let project_ids: Vec<ObjectId> = projects.iter().filter_map(|p| p.id).collect();

        let assigned_tasks_by_status = self
            .tasks
            .count_assigned_by_status(principal.user_id, &project_ids)
            .await?
            .into_iter()
            .collect();

        Ok(DashboardSummary {
            project_count: projects.len(),
            assigned_tasks_by_status,
            pending_status_requests: self
                .requests
                .count_pending_in_projects(&admin_projects)
                .await?,
            pending_proposals: self
                .proposals
                .count_pending_in_projects(&admin_projects)
                .await?,
            unread_notifications: self.notifications.unread_count(principal.user_id).await?,
        })
    }
}
