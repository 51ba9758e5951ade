use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::StoreError;
use crate::entities::{prelude::*, users};
use crate::models::PasswordDigest;

/// User data returned from repository (without the password digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub api_key: String,
    pub is_admin: bool,
    pub last_login: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            api_key: model.api_key,
            is_admin: model.is_admin,
            last_login: model.last_login,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user. `id`, `api_key` and `last_login` are generated per row.
    pub async fn create(&self, username: &str, password: PasswordDigest) -> Result<User, StoreError> {
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password: Set(password),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(|e| StoreError::classify("users", e))?;

        info!(user_id = %model.id, username = %model.username, "User created");
        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = Users::find_by_id(id).one(&self.conn).await?;
        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    /// Get user by username together with its password digest (for credential checks)
    pub async fn get_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, PasswordDigest)>, StoreError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(user.map(|u| {
            let password = u.password.clone();
            (User::from(u), password)
        }))
    }

    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        let user = Users::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    pub async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = Users::find()
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await?;

        Ok(users.into_iter().map(User::from).collect())
    }

    /// Set `last_login` to now in a single statement. Concurrent logins race
    /// on the same row and the last writer wins.
    pub async fn touch_last_login(&self, id: Uuid) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();

        let result = Users::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }

        debug!(user_id = %id, "Updated last login");
        Ok(now)
    }

    pub async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<User, StoreError> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;

        let mut active: users::ActiveModel = user.into();
        active.is_admin = Set(is_admin);
        let model = active.update(&self.conn).await?;

        info!(user_id = %id, is_admin, "Admin flag updated");
        Ok(User::from(model))
    }

    /// Replace the API key with a freshly generated one
    pub async fn regenerate_api_key(&self, id: Uuid) -> Result<String, StoreError> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;

        let new_api_key = users::generate_api_key();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active
            .update(&self.conn)
            .await
            .map_err(|e| StoreError::classify("users", e))?;

        info!(user_id = %id, "API key regenerated");
        Ok(new_api_key)
    }

    /// Delete a user. Its heartbeats are removed by the `ON DELETE CASCADE` foreign key.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = Users::delete_by_id(id).exec(&self.conn).await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
