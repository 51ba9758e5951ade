//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::models::PasswordDigest;
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::Validation("Username cannot be empty".to_string()));
    }

    if username.trim() != username {
        return Err(AuthError::Validation(
            "Username cannot start or end with whitespace".to_string(),
        ));
    }

    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, username: &str, password: PasswordDigest) -> Result<User, AuthError> {
        validate_username(username)?;

        let user = self.store.create_user(username, password).await?;
        Ok(user)
    }

    async fn register_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        validate_username(username)?;

        if password.is_empty() {
            return Err(AuthError::Validation("Password cannot be empty".to_string()));
        }

        let password = password.to_string();
        let security = self.security.clone();

        // Argon2 is CPU-intensive and would block the async runtime
        let digest = task::spawn_blocking(move || PasswordDigest::hash(&password, &security))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))??;

        self.register(username, digest).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some((user, digest)) = self.store.get_user_with_password(username).await? else {
            metrics::counter!("auth_logins_total", "outcome" => "unknown_user").increment(1);
            return Err(AuthError::NotFound);
        };

        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || digest.verify(&password))
            .await
            .map_err(|e| {
                AuthError::Internal(format!("Password verification task panicked: {e}"))
            })?;

        if !is_valid {
            metrics::counter!("auth_logins_total", "outcome" => "invalid").increment(1);
            warn!(username = %username, "Rejected login with invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let last_login = self.store.touch_last_login(user.id).await?;
        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "User logged in");

        Ok(User { last_login, ..user })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<User, AuthError> {
        self.store
            .get_user_by_api_key(api_key)
            .await?
            .ok_or(AuthError::NotFound)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, AuthError> {
        self.store.get_user(id).await?.ok_or(AuthError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, AuthError> {
        self.store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.list_users().await?)
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<User, AuthError> {
        Ok(self.store.set_user_admin(id, is_admin).await?)
    }

    async fn regenerate_api_key(&self, id: Uuid) -> Result<String, AuthError> {
        Ok(self.store.regenerate_user_api_key(id).await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AuthError> {
        Ok(self.store.delete_user(id).await?)
    }
}
