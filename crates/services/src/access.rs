use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::{ProjectRole, SystemRole};

use crate::dao::{
    base::{DaoError, DaoResult},
    project::ProjectDao,
};

/// The authenticated caller, resolved by the transport layer and passed
/// explicitly into every project-scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: ObjectId,
    pub system_role: SystemRole,
}

impl Principal {
    pub fn new(user_id: ObjectId, system_role: SystemRole) -> Self {
        Self {
            user_id,
            system_role,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.system_role == SystemRole::SuperAdmin
    }
}

/// Super-admins are admins of every project; everyone else gets exactly the
/// role stored on their membership row, or no access at all.
pub fn effective_role(
    system_role: SystemRole,
    membership: Option<ProjectRole>,
) -> Option<ProjectRole> {
    if system_role == SystemRole::SuperAdmin {
        return Some(ProjectRole::Admin);
    }
    membership
}

pub fn require_member(role: Option<ProjectRole>) -> DaoResult<ProjectRole> {
    role.ok_or_else(|| DaoError::Forbidden("Not a member of this project".to_string()))
}

pub fn require_can_mutate(role: Option<ProjectRole>) -> DaoResult<ProjectRole> {
    let role = require_member(role)?;
    if !role.can_mutate() {
        return Err(DaoError::Forbidden(
            "Viewers cannot modify this project".to_string(),
        ));
    }
    Ok(role)
}

pub fn require_admin(role: Option<ProjectRole>) -> DaoResult<ProjectRole> {
    let role = require_member(role)?;
    if !role.is_admin() {
        return Err(DaoError::Forbidden(
            "Project admin role required".to_string(),
        ));
    }
    Ok(role)
}

pub struct AccessService {
    projects: Arc<ProjectDao>,
}

impl AccessService {
    pub fn new(projects: Arc<ProjectDao>) -> Self {
        Self { projects }
    }

    /// `Ok(None)` means the caller has no access to the project. A missing or
    /// deleted project is `NotFound` regardless of the caller.
    pub async fn resolve_role(
        &self,
        project_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<Option<ProjectRole>> {
        self.projects.find_live(project_id).await?;

        if principal.is_super_admin() {
            return Ok(effective_role(principal.system_role, None));
        }

        let membership = self
            .projects
            .get_membership(project_id, principal.user_id)
            .await?;
        Ok(effective_role(
            principal.system_role,
            membership.map(|m| m.role),
        ))
    }

    pub async fn assert_member(
        &self,
        project_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<ProjectRole> {
        require_member(self.resolve_role(project_id, principal).await?)
    }

    pub async fn assert_can_mutate(
        &self,
        project_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<ProjectRole> {
        require_can_mutate(self.resolve_role(project_id, principal).await?)
    }

    pub async fn assert_admin(
        &self,
        project_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<ProjectRole> {
        require_admin(self.resolve_role(project_id, principal).await?)
    }

    /// Every live project in which the caller resolves to admin.
    pub async fn admin_project_ids(&self, principal: &Principal) -> DaoResult<Vec<ObjectId>> {
        if principal.is_super_admin() {
            let projects = self.projects.find_all_live().await?;
            return Ok(projects.into_iter().filter_map(|p| p.id).collect());
        }
        self.projects.admin_project_ids(principal.user_id).await
    }
}
