use bson::oid::ObjectId;
use std::sync::Arc;
use taskflow_db::models::{NotificationType, Project, ProjectMember, ProjectRole};
use tracing::info;

use crate::{
    access::{AccessService, Principal},
    dao::{
        base::{DaoError, DaoResult},
        notification::NewNotification,
        project::ProjectDao,
        task::TaskDao,
        user::UserDao,
    },
    dispatch::Dispatcher,
};

/// Projects and the memberships that authorize everything inside them.
pub struct MembershipService {
    access: Arc<AccessService>,
    projects: Arc<ProjectDao>,
    tasks: Arc<TaskDao>,
    users: Arc<UserDao>,
    dispatcher: Arc<Dispatcher>,
}

impl MembershipService {
    pub fn new(
        access: Arc<AccessService>,
        projects: Arc<ProjectDao>,
        tasks: Arc<TaskDao>,
        users: Arc<UserDao>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            access,
            projects,
            tasks,
            users,
            dispatcher,
        }
    }

    pub async fn create_project(
        &self,
        name: String,
        description: Option<String>,
        creator: &Principal,
    ) -> DaoResult<Project> {
        if name.trim().is_empty() {
            return Err(DaoError::Validation("name is required".to_string()));
        }
        let project = self
            .projects
            .create(name, description, creator.user_id)
            .await?;
        info!(project_id = ?project.id, creator = ?creator.user_id, "Project created");
        Ok(project)
    }

    pub async fn list_projects(&self, principal: &Principal) -> DaoResult<Vec<Project>> {
        if principal.is_super_admin() {
            return self.projects.find_all_live().await;
        }
        self.projects.find_user_projects(principal.user_id).await
    }

    pub async fn get_project(
        &self,
        project_id: ObjectId,
        principal: &Principal,
    ) -> DaoResult<(Project, ProjectRole)> {
        let role = self.access.assert_member(project_id, principal).await?;
        let project = self.projects.find_live(project_id).await?;
        Ok((project, role))
    }

    pub async fn update_project(
        &self,
        project_id: ObjectId,
        principal: &Principal,
        name: Option<String>,
        description: Option<String>,
    ) -> DaoResult<Project> {
        self.access.assert_admin(project_id, principal).await?;
        if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DaoError::Validation("name cannot be blank".to_string()));
        }
        self.projects.update(project_id, name, description).await?;
        self.projects.find_live(project_id).await
    }

    pub async fn delete_project(&self, project_id: ObjectId, principal: &Principal) -> DaoResult<()> {
        self.access.assert_admin(project_id, principal).await?;
        self.projects.base.soft_delete(project_id).await?;
        info!(?project_id, by = ?principal.user_id, "Project deleted");
        Ok(())
    }

    pub async fn list_members(
        &self,
        project_id: ObjectId,
        principal: &Principal,
        role: Option<ProjectRole>,
    ) -> DaoResult<Vec<ProjectMember>> {
        self.access.assert_member(project_id, principal).await?;
        self.projects.list_members(project_id, role).await
    }

    pub async fn add_member(
        &self,
        project_id: ObjectId,
        actor: &Principal,
        user_id: ObjectId,
        role: ProjectRole,
    ) -> DaoResult<ProjectMember> {
        self.access.assert_admin(project_id, actor).await?;
        let project = self.projects.find_live(project_id).await?;
        let user = self.users.base.find_by_id(user_id).await?;
        if !user.is_active {
            return Err(DaoError::Validation(
                "cannot add a deactivated user".to_string(),
            ));
        }

        let member = self
            .projects
            .add_member(project_id, user_id, role, Some(actor.user_id))
            .await?;
        info!(?project_id, ?user_id, role = role.as_str(), "Member added");

        self.dispatcher
            .notify(NewNotification {
                user_id,
                notification_type: NotificationType::ProjectMemberAdded,
                title: "Added to project".to_string(),
                message: format!(
                    "You were added to \"{}\" as {}",
                    project.name,
                    role.as_str()
                ),
                related_entity_id: Some(project_id),
                action_url: Some(project_url(project_id)),
            })
            .await;
        self.dispatcher
            .post_system_message(
                project_id,
                &format!("{} joined the project as {}", user.display_name, role.as_str()),
            )
            .await;

        Ok(member)
    }

    pub async fn change_member_role(
        &self,
        project_id: ObjectId,
        actor: &Principal,
        user_id: ObjectId,
        role: ProjectRole,
    ) -> DaoResult<ProjectMember> {
        self.access.assert_admin(project_id, actor).await?;
        let project = self.projects.find_live(project_id).await?;
        if project.creator_id == user_id && role != ProjectRole::Admin {
            return Err(DaoError::Validation(
                "the project creator must remain an admin".to_string(),
            ));
        }

        let member = self
            .projects
            .update_role(project_id, user_id, role)
            .await?
            .ok_or(DaoError::NotFound)?;
        info!(?project_id, ?user_id, role = role.as_str(), "Member role changed");

        let name = self.users.display_name(user_id).await;
        self.dispatcher
            .notify(NewNotification {
                user_id,
                notification_type: NotificationType::ProjectRoleChanged,
                title: "Project role changed".to_string(),
                message: format!(
                    "Your role in \"{}\" is now {}",
                    project.name,
                    role.as_str()
                ),
                related_entity_id: Some(project_id),
                action_url: Some(project_url(project_id)),
            })
            .await;
        self.dispatcher
            .post_system_message(
                project_id,
                &format!("{} is now {}", name, role.as_str()),
            )
            .await;

        Ok(member)
    }

    pub async fn remove_member(
        &self,
        project_id: ObjectId,
        actor: &Principal,
        user_id: ObjectId,
    ) -> DaoResult<()> {
        self.access.assert_admin(project_id, actor).await?;
        let project = self.projects.find_live(project_id).await?;
        if project.creator_id == user_id {
            return Err(DaoError::Validation(
                "the project creator cannot be removed".to_string(),
            ));
        }

        if !self.projects.remove_member(project_id, user_id).await? {
            return Err(DaoError::NotFound);
        }
        let unassigned = self.tasks.unassign_in_project(project_id, user_id).await?;
        info!(?project_id, ?user_id, unassigned, "Member removed");

        let name = self.users.display_name(user_id).await;
        self.dispatcher
            .notify(NewNotification {
                user_id,
                notification_type: NotificationType::ProjectMemberRemoved,
                title: "Removed from project".to_string(),
                message: format!("You were removed from \"{}\"", project.name),
                related_entity_id: Some(project_id),
                action_url: None,
            })
            .await;
        self.dispatcher
            .post_system_message(project_id, &format!("{} left the project", name))
            .await;

        Ok(())
    }
}

fn project_url(project_id: ObjectId) -> String {
    format!("/projects/{}", project_id.to_hex())
}
