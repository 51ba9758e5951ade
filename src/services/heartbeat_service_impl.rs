//! `SeaORM` implementation of the `HeartbeatService` trait.

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::{Heartbeat, Store, StoreError};
use crate::models::{BatchOutcome, GroupBy, HeartbeatBatch, HeartbeatFilter, NewHeartbeat};
use crate::services::heartbeat_service::{HeartbeatError, HeartbeatPage, HeartbeatService};

pub struct SeaOrmHeartbeatService {
    store: Store,
}

impl SeaOrmHeartbeatService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn validate(beat: &NewHeartbeat) -> Result<(), HeartbeatError> {
    if beat.hash.trim().is_empty() {
        return Err(HeartbeatError::Validation(
            "Heartbeat hash cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Store errors carry the constraint text; the caller wants the hash or user it concerns.
fn map_write_error(err: StoreError, user_id: Uuid, hash: Option<String>) -> HeartbeatError {
    match err {
        StoreError::ForeignKey(_) => HeartbeatError::ForeignKey(user_id),
        StoreError::Conflict { detail, .. } => HeartbeatError::Conflict(hash.unwrap_or(detail)),
        other => other.into(),
    }
}

#[async_trait]
impl HeartbeatService for SeaOrmHeartbeatService {
    async fn record(&self, user_id: Uuid, beat: NewHeartbeat) -> Result<Heartbeat, HeartbeatError> {
        validate(&beat)?;

        let hash = beat.hash.clone();
        match self.store.record_heartbeat(user_id, beat).await {
            Ok(model) => {
                metrics::counter!("heartbeats_recorded_total").increment(1);
                Ok(model)
            }
            Err(err) => {
                if matches!(err, StoreError::Conflict { .. }) {
                    metrics::counter!("heartbeats_duplicate_total").increment(1);
                    debug!(hash = %hash, "Rejected duplicate heartbeat");
                }
                Err(map_write_error(err, user_id, Some(hash)))
            }
        }
    }

    #[instrument(skip(self, batch), fields(trace_id = %batch.trace_id, user_id = %batch.user_id, size = batch.list.len()))]
    async fn record_batch(&self, batch: HeartbeatBatch) -> Result<BatchOutcome, HeartbeatError> {
        batch.list.iter().try_for_each(validate)?;

        let user_id = batch.user_id;
        let outcome = self
            .store
            .record_heartbeats(user_id, batch.list)
            .await
            .map_err(|e| map_write_error(e, user_id, None))?;

        metrics::counter!("heartbeats_recorded_total").increment(outcome.inserted);
        metrics::counter!("heartbeats_duplicate_total").increment(outcome.duplicates);

        Ok(outcome)
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<Heartbeat>, HeartbeatError> {
        Ok(self.store.find_heartbeat_by_hash(hash).await?)
    }

    async fn list(
        &self,
        filter: &HeartbeatFilter,
        page: u64,
        page_size: u64,
    ) -> Result<HeartbeatPage, HeartbeatError> {
        if page_size == 0 {
            return Err(HeartbeatError::Validation(
                "Page size must be greater than 0".to_string(),
            ));
        }

        let page = page.max(1);
        let (items, total_pages) = self.store.list_heartbeats(filter, page, page_size).await?;

        Ok(HeartbeatPage {
            items,
            page,
            total_pages,
        })
    }

    async fn count(&self, filter: &HeartbeatFilter) -> Result<u64, HeartbeatError> {
        Ok(self.store.count_heartbeats(filter).await?)
    }

    async fn count_by(
        &self,
        user_id: Uuid,
        group: GroupBy,
    ) -> Result<Vec<(String, u64)>, HeartbeatError> {
        Ok(self.store.count_heartbeats_by(user_id, group).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(hash: &str) -> NewHeartbeat {
        NewHeartbeat {
            entity: "app1".to_string(),
            kind: "visit".to_string(),
            category: "browsing".to_string(),
            browser: "firefox".to_string(),
            domain: "example.com".to_string(),
            path: "/".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            time: None,
            hash: hash.to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_blank_hash() {
        assert!(validate(&beat("h1")).is_ok());
        assert!(matches!(
            validate(&beat("  ")),
            Err(HeartbeatError::Validation(_))
        ));
    }

    #[test]
    fn test_map_write_error() {
        let user_id = Uuid::new_v4();

        let fk = map_write_error(StoreError::ForeignKey("x".to_string()), user_id, None);
        assert!(matches!(fk, HeartbeatError::ForeignKey(id) if id == user_id));

        let conflict = map_write_error(
            StoreError::Conflict {
                table: "heartbeats",
                detail: "UNIQUE constraint failed: heartbeats.hash".to_string(),
            },
            user_id,
            Some("h1".to_string()),
        );
        assert!(matches!(conflict, HeartbeatError::Conflict(h) if h == "h1"));
    }
}
