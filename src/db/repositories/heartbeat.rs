use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::db::StoreError;
use crate::entities::{heartbeats, prelude::*};
use crate::models::{BatchOutcome, GroupBy, HeartbeatFilter, NewHeartbeat};

/// SQLite caps bound parameters per statement at 32766; a heartbeat row binds 12.
const BATCH_CHUNK_ROWS: usize = 32766 / 12;

pub struct HeartbeatRepository {
    conn: DatabaseConnection,
}

impl HeartbeatRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert one heartbeat. A repeated `hash` is a conflict, an unknown
    /// `user_id` a foreign key violation; both are reported by the database.
    pub async fn record(
        &self,
        user_id: Uuid,
        beat: NewHeartbeat,
    ) -> Result<heartbeats::Model, StoreError> {
        let model = to_active_model(user_id, beat)
            .insert(&self.conn)
            .await
            .map_err(|e| StoreError::classify("heartbeats", e))?;

        debug!(id = %model.id, user_id = %user_id, hash = %model.hash, "Heartbeat recorded");
        Ok(model)
    }

    /// Insert a batch in one transaction, skipping rows whose hash is already stored.
    ///
    /// The user is checked up front because `ON CONFLICT DO NOTHING` drops a
    /// duplicate row before its foreign key is ever evaluated.
    pub async fn record_many(
        &self,
        user_id: Uuid,
        beats: Vec<NewHeartbeat>,
    ) -> Result<BatchOutcome, StoreError> {
        if beats.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let total = beats.len() as u64;
        let txn = self.conn.begin().await?;

        if Users::find_by_id(user_id).one(&txn).await?.is_none() {
            return Err(StoreError::ForeignKey(format!("unknown user {user_id}")));
        }

        let mut inserted = 0;
        let mut rows = beats
            .into_iter()
            .map(|beat| to_active_model(user_id, beat).stamped())
            .peekable();

        while rows.peek().is_some() {
            let chunk: Vec<_> = rows.by_ref().take(BATCH_CHUNK_ROWS).collect();
            inserted += Heartbeats::insert_many(chunk)
                .on_conflict(
                    OnConflict::column(heartbeats::Column::Hash)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(|e| StoreError::classify("heartbeats", e))?;
        }

        txn.commit().await?;

        let outcome = BatchOutcome {
            inserted,
            duplicates: total.saturating_sub(inserted),
        };

        debug!(
            user_id = %user_id,
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "Heartbeat batch recorded"
        );
        Ok(outcome)
    }

    pub async fn get(&self, id: &str) -> Result<Option<heartbeats::Model>, StoreError> {
        Ok(Heartbeats::find_by_id(id.to_string())
            .one(&self.conn)
            .await?)
    }

    pub async fn find_by_hash(&self, hash: &str) -> Result<Option<heartbeats::Model>, StoreError> {
        Ok(Heartbeats::find()
            .filter(heartbeats::Column::Hash.eq(hash))
            .one(&self.conn)
            .await?)
    }

    /// Page through matching heartbeats, newest event time first.
    /// Pages are numbered from 1; returns the page and the total page count.
    pub async fn list(
        &self,
        filter: &HeartbeatFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<heartbeats::Model>, u64), StoreError> {
        let query = apply_filter(Heartbeats::find(), filter)
            .order_by_desc(heartbeats::Column::Time)
            .order_by_desc(heartbeats::Column::CreatedAt);

        let paginator = query.paginate(&self.conn, page_size.max(1));
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn count(&self, filter: &HeartbeatFilter) -> Result<u64, StoreError> {
        Ok(apply_filter(Heartbeats::find(), filter)
            .count(&self.conn)
            .await?)
    }

    /// Number of heartbeats per distinct value of `group` for one user,
    /// most frequent first.
    pub async fn count_by(
        &self,
        user_id: Uuid,
        group: GroupBy,
    ) -> Result<Vec<(String, u64)>, StoreError> {
        let column = group_column(group);

        let rows: Vec<(String, i64)> = Heartbeats::find()
            .select_only()
            .column(column)
            .column_as(Expr::col(heartbeats::Column::Id).count(), "hits")
            .filter(heartbeats::Column::UserId.eq(user_id))
            .group_by(column)
            .into_tuple()
            .all(&self.conn)
            .await?;

        rank_counts(rows)
    }
}

/// Most frequent first, ties by value.
fn rank_counts(rows: Vec<(String, i64)>) -> Result<Vec<(String, u64)>, StoreError> {
    let mut counts = rows
        .into_iter()
        .map(|(value, hits)| {
            u64::try_from(hits)
                .map(|hits| (value, hits))
                .map_err(|_| StoreError::Internal(format!("negative group count {hits}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(counts)
}

fn to_active_model(user_id: Uuid, beat: NewHeartbeat) -> heartbeats::ActiveModel {
    heartbeats::ActiveModel {
        user_id: Set(user_id),
        entity: Set(beat.entity),
        kind: Set(beat.kind),
        category: Set(beat.category),
        browser: Set(beat.browser),
        domain: Set(beat.domain),
        path: Set(beat.path),
        user_agent: Set(beat.user_agent),
        time: Set(beat.time),
        hash: Set(beat.hash),
        ..Default::default()
    }
}

fn apply_filter(mut query: Select<Heartbeats>, filter: &HeartbeatFilter) -> Select<Heartbeats> {
    if let Some(user_id) = filter.user_id {
        query = query.filter(heartbeats::Column::UserId.eq(user_id));
    }

    let equalities = [
        (heartbeats::Column::Entity, &filter.entity),
        (heartbeats::Column::Kind, &filter.kind),
        (heartbeats::Column::Category, &filter.category),
        (heartbeats::Column::Browser, &filter.browser),
        (heartbeats::Column::Domain, &filter.domain),
        (heartbeats::Column::Path, &filter.path),
    ];

    for (column, value) in equalities {
        if let Some(value) = value {
            query = query.filter(column.eq(value.as_str()));
        }
    }

    if let Some(since) = filter.since {
        query = query.filter(heartbeats::Column::Time.gte(since));
    }

    if let Some(until) = filter.until {
        query = query.filter(heartbeats::Column::Time.lte(until));
    }

    query
}

const fn group_column(group: GroupBy) -> heartbeats::Column {
    match group {
        GroupBy::Entity => heartbeats::Column::Entity,
        GroupBy::Kind => heartbeats::Column::Kind,
        GroupBy::Category => heartbeats::Column::Category,
        GroupBy::Browser => heartbeats::Column::Browser,
        GroupBy::Domain => heartbeats::Column::Domain,
        GroupBy::Path => heartbeats::Column::Path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_counts_orders_by_hits() {
        let ranked = rank_counts(vec![
            ("b.com".to_string(), 2),
            ("a.com".to_string(), 2),
            ("c.com".to_string(), 5),
        ])
        .unwrap();

        assert_eq!(
            ranked,
            vec![
                ("c.com".to_string(), 5),
                ("a.com".to_string(), 2),
                ("b.com".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_rank_counts_rejects_negative_hits() {
        assert!(matches!(
            rank_counts(vec![("a.com".to_string(), -1)]),
            Err(StoreError::Internal(_))
        ));
    }

    #[test]
    fn test_chunk_stays_under_sqlite_variable_limit() {
        assert!(BATCH_CHUNK_ROWS * 12 <= 32766);
    }
}
