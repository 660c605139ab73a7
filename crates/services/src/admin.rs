use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::{SystemRole, User};
use tracing::info;

use crate::{
    access::Principal,
    dao::{
        base::{DaoError, DaoResult, PaginatedResult, PaginationParams},
        notification::NotificationDao,
        project::ProjectDao,
        user::UserDao,
    },
};

/// Installation-wide account management, restricted to super-admins.
pub struct UserAdminService {
    users: Arc<UserDao>,
    projects: Arc<ProjectDao>,
    notifications: Arc<NotificationDao>,
}

impl UserAdminService {
    pub fn new(
        users: Arc<UserDao>,
        projects: Arc<ProjectDao>,
        notifications: Arc<NotificationDao>,
    ) -> Self {
        Self {
            users,
            projects,
            notifications,
        }
    }

    pub async fn list_users(
        &self,
        principal: &Principal,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<User>> {
        require_super_admin(principal)?;
        self.users.list(params).await
    }

    pub async fn update_user(
        &self,
        principal: &Principal,
        user_id: ObjectId,
        is_active: Option<bool>,
        system_role: Option<SystemRole>,
    ) -> DaoResult<User> {
        require_super_admin(principal)?;
        if user_id == principal.user_id
            && (is_active == Some(false) || system_role == Some(SystemRole::User))
        {
            return Err(DaoError::Validation(
                "you cannot deactivate or demote yourself".to_string(),
            ));
        }

        self.users.base.find_by_id(user_id).await?;
        self.users
            .update_admin_fields(user_id, is_active, system_role)
            .await?;
        info!(?user_id, ?is_active, ?system_role, "User updated by admin");
        self.users.base.find_by_id(user_id).await
    }

    /// Hard delete. Memberships and notifications of the user go with it.
    pub async fn delete_user(&self, principal: &Principal, user_id: ObjectId) -> DaoResult<()> {
        require_super_admin(principal)?;
        if user_id == principal.user_id {
            return Err(DaoError::Validation("you cannot delete yourself".to_string()));
        }

        self.users.base.find_by_id(user_id).await?;
        let memberships = self.projects.remove_user_everywhere(user_id).await?;
        self.notifications.delete_for_user(user_id).await?;
        self.users.delete(user_id).await?;
        info!(?user_id, memberships, "User deleted");
        Ok(())
    }
}

fn require_super_admin(principal: &Principal) -> DaoResult<()> {
    if !principal.is_super_admin() {
        return Err(DaoError::Forbidden("Super-admin role required".to_string()));
    }
    Ok(())
}
