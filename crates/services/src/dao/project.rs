use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use taskflow_db::models::{Project, ProjectMember, ProjectRole};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ProjectDao {
    pub base: BaseDao<Project>,
    pub members: BaseDao<ProjectMember>,
}

impl ProjectDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Project::COLLECTION),
            members: BaseDao::new(db, ProjectMember::COLLECTION),
        }
    }

    /// Inserts the project and makes its creator an admin member.
    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
        creator_id: ObjectId,
    ) -> DaoResult<Project> {
        let now = DateTime::now();
        let project = Project {
            id: None,
            name,
            description,
            creator_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let project_id = self.base.insert_one(&project).await?;
        self.add_member(project_id, creator_id, ProjectRole::Admin, None)
            .await?;

        self.base.find_by_id(project_id).await
    }

    pub async fn find_live(&self, project_id: ObjectId) -> DaoResult<Project> {
        self.base
            .find_one(doc! { "_id": project_id, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_all_live(&self) -> DaoResult<Vec<Project>> {
        self.base
            .find_many(doc! { "deleted_at": null }, Some(doc! { "name": 1 }))
            .await
    }

    pub async fn find_user_projects(&self, user_id: ObjectId) -> DaoResult<Vec<Project>> {
        let memberships = self
            .members
            .find_many(doc! { "user_id": user_id }, None)
            .await?;

        let project_ids: Vec<ObjectId> = memberships.iter().map(|m| m.project_id).collect();

        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": project_ids }, "deleted_at": null },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn update(
        &self,
        project_id: ObjectId,
        name: Option<String>,
        description: Option<String>,
    ) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(name) = name {
            update.insert("name", name);
        }
        if let Some(description) = description {
            update.insert("description", description);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_one(
                doc! { "_id": project_id, "deleted_at": null },
                doc! { "$set": update },
            )
            .await
    }

    pub async fn get_membership(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<ProjectMember>> {
        self.members
            .find_one(doc! { "project_id": project_id, "user_id": user_id })
            .await
    }

    pub async fn add_member(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
        role: ProjectRole,
        added_by: Option<ObjectId>,
    ) -> DaoResult<ProjectMember> {
        let now = DateTime::now();
        let member = ProjectMember {
            id: None,
            project_id,
            user_id,
            role,
            added_by,
            joined_at: now,
            updated_at: now,
        };

        let id = self.members.insert_one(&member).await?;
        self.members.find_by_id(id).await
    }

    pub async fn update_role(
        &self,
        project_id: ObjectId,
        user_id: ObjectId,
        role: ProjectRole,
    ) -> DaoResult<Option<ProjectMember>> {
        self.members
            .find_one_and_update(
                doc! { "project_id": project_id, "user_id": user_id },
                doc! { "$set": { "role": role.as_str() } },
            )
            .await
    }

    pub async fn remove_member(&self, project_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        let deleted = self
            .members
            .hard_delete(doc! { "project_id": project_id, "user_id": user_id })
            .await?;
        Ok(deleted > 0)
    }

    /// Drops every membership a user holds; used when the account is deleted.
    pub async fn remove_user_everywhere(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.members.hard_delete(doc! { "user_id": user_id }).await
    }

    pub async fn list_members(
        &self,
        project_id: ObjectId,
        role: Option<ProjectRole>,
    ) -> DaoResult<Vec<ProjectMember>> {
        let mut filter = doc! { "project_id": project_id };
        if let Some(role) = role {
            filter.insert("role", role.as_str());
        }
        self.members
            .find_many(filter, Some(doc! { "joined_at": 1 }))
            .await
    }

    pub async fn admin_user_ids(&self, project_id: ObjectId) -> DaoResult<Vec<ObjectId>> {
        let admins = self
            .list_members(project_id, Some(ProjectRole::Admin))
            .await?;
        Ok(admins.into_iter().map(|m| m.user_id).collect())
    }

    /// Live projects in which `user_id` holds an explicit admin membership.
    pub async fn admin_project_ids(&self, user_id: ObjectId) -> DaoResult<Vec<ObjectId>> {
        let memberships = self
            .members
            .find_many(
                doc! { "user_id": user_id, "role": ProjectRole::Admin.as_str() },
                None,
            )
            .await?;

        let project_ids: Vec<ObjectId> = memberships.iter().map(|m| m.project_id).collect();
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let live = self
            .base
            .find_many(
                doc! { "_id": { "$in": project_ids }, "deleted_at": null },
                None,
            )
            .await?;
        Ok(live.into_iter().filter_map(|p| p.id).collect())
    }
}
