//! Domain service for recording and querying heartbeats.

use thiserror::Error;
use uuid::Uuid;

use crate::db::{Heartbeat, StoreError};
use crate::models::{BatchOutcome, GroupBy, HeartbeatBatch, HeartbeatFilter, NewHeartbeat};

#[derive(Debug, Error)]
pub enum HeartbeatError {
    /// A heartbeat with the same fingerprint is already stored.
    #[error("Duplicate heartbeat: {0}")]
    Conflict(String),

    #[error("Unknown user: {0}")]
    ForeignKey(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for HeartbeatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { detail, .. } => Self::Conflict(detail),
            StoreError::Database(e) => Self::Database(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// One page of heartbeats.
#[derive(Debug, Clone)]
pub struct HeartbeatPage {
    pub items: Vec<Heartbeat>,
    pub page: u64,
    pub total_pages: u64,
}

#[async_trait::async_trait]
pub trait HeartbeatService: Send + Sync {
    /// Stores one heartbeat for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::Conflict`] when the hash is already stored and
    /// [`HeartbeatError::ForeignKey`] when `user_id` does not exist.
    async fn record(&self, user_id: Uuid, beat: NewHeartbeat) -> Result<Heartbeat, HeartbeatError>;

    /// Stores a batch; already-seen hashes are counted as duplicates, not errors.
    async fn record_batch(&self, batch: HeartbeatBatch) -> Result<BatchOutcome, HeartbeatError>;

    async fn find_by_hash(&self, hash: &str) -> Result<Option<Heartbeat>, HeartbeatError>;

    async fn list(
        &self,
        filter: &HeartbeatFilter,
        page: u64,
        page_size: u64,
    ) -> Result<HeartbeatPage, HeartbeatError>;

    async fn count(&self, filter: &HeartbeatFilter) -> Result<u64, HeartbeatError>;

    /// Heartbeat counts for one user grouped by an indexed column.
    async fn count_by(
        &self,
        user_id: Uuid,
        group: GroupBy,
    ) -> Result<Vec<(String, u64)>, HeartbeatError>;
}
