//! Domain service for user accounts and authentication.
//!
//! Handles registration, login by credential or API key, admin promotion and
//! API key rotation.

use thiserror::Error;
use uuid::Uuid;

use crate::db::{StoreError, User};
use crate::models::{CredentialError, PasswordDigest};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("User not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict_on("username") {
            return Self::Conflict("username already exists".to_string());
        }

        match err {
            StoreError::Conflict { detail, .. } => Self::Conflict(detail),
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::Database(e) => Self::Database(e.to_string()),
            StoreError::ForeignKey(detail) | StoreError::Internal(detail) => Self::Internal(detail),
        }
    }
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Hashing(msg) => Self::Internal(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account from an already-hashed credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the username is taken.
    async fn register(&self, username: &str, password: PasswordDigest) -> Result<User, AuthError>;

    /// Hashes `password` with the configured Argon2 parameters, then registers.
    async fn register_with_password(&self, username: &str, password: &str)
    -> Result<User, AuthError>;

    /// Verifies credentials and records the login time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] for an unknown username and
    /// [`AuthError::InvalidCredentials`] for a wrong password.
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Resolves an API key to its user.
    async fn verify_api_key(&self, api_key: &str) -> Result<User, AuthError>;

    async fn get_user(&self, id: Uuid) -> Result<User, AuthError>;

    async fn get_user_by_username(&self, username: &str) -> Result<User, AuthError>;

    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    /// Promotes or demotes a user. Authorization is the caller's concern.
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<User, AuthError>;

    /// Regenerates the API key for a user and returns the new one.
    async fn regenerate_api_key(&self, id: Uuid) -> Result<String, AuthError>;

    /// Deletes a user together with its heartbeats.
    async fn delete_user(&self, id: Uuid) -> Result<(), AuthError>;
}
