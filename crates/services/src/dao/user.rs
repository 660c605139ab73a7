use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use taskflow_db::models::{SystemRole, User};

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        username: String,
        display_name: String,
        password_hash: String,
        system_role: SystemRole,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            username,
            display_name,
            password_hash: Some(password_hash),
            system_role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "username": username })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_many_by_ids(&self, ids: &[ObjectId]) -> DaoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.base
            .find_many(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
    }

    /// Display name for message text; falls back to a neutral label.
    pub async fn display_name(&self, user_id: ObjectId) -> String {
        match self.base.find_by_id(user_id).await {
            Ok(user) => user.display_name,
            Err(_) => "A user".to_string(),
        }
    }

    pub async fn touch_login(&self, user_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! { "$set": { "last_login_at": DateTime::now() } },
            )
            .await
    }

    pub async fn list(&self, params: &PaginationParams) -> DaoResult<PaginatedResult<User>> {
        self.base
            .find_paginated(doc! {}, Some(doc! { "created_at": 1 }), params)
            .await
    }

    pub async fn update_admin_fields(
        &self,
        user_id: ObjectId,
        is_active: Option<bool>,
        system_role: Option<SystemRole>,
    ) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(active) = is_active {
            update.insert("is_active", active);
        }
        if let Some(role) = system_role {
            update.insert("system_role", role.as_str());
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(user_id, doc! { "$set": update })
            .await
    }

    pub async fn delete(&self, user_id: ObjectId) -> DaoResult<bool> {
        let deleted = self.base.hard_delete(doc! { "_id": user_id }).await?;
        Ok(deleted > 0)
    }
}
