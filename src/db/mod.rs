use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::entities::heartbeats;
use crate::models::{BatchOutcome, GroupBy, HeartbeatFilter, NewHeartbeat, PasswordDigest};

pub mod error;
pub mod migrator;
pub mod repositories;

pub use error::StoreError;
pub use repositories::user::User;

pub type Heartbeat = heartbeats::Model;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        // Every connection to `sqlite::memory:` opens its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn heartbeat_repo(&self) -> repositories::heartbeat::HeartbeatRepository {
        repositories::heartbeat::HeartbeatRepository::new(self.conn.clone())
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: PasswordDigest,
    ) -> Result<User, StoreError> {
        self.user_repo().create(username, password).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, PasswordDigest)>, StoreError> {
        self.user_repo().get_with_password(username).await
    }

    pub async fn get_user_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        self.user_repo().get_by_api_key(api_key).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.user_repo().list().await
    }

    pub async fn touch_last_login(
        &self,
        id: Uuid,
    ) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
        self.user_repo().touch_last_login(id).await
    }

    pub async fn set_user_admin(&self, id: Uuid, is_admin: bool) -> Result<User, StoreError> {
        self.user_repo().set_admin(id, is_admin).await
    }

    pub async fn regenerate_user_api_key(&self, id: Uuid) -> Result<String, StoreError> {
        self.user_repo().regenerate_api_key(id).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        self.user_repo().delete(id).await
    }

    pub async fn record_heartbeat(
        &self,
        user_id: Uuid,
        beat: NewHeartbeat,
    ) -> Result<Heartbeat, StoreError> {
        self.heartbeat_repo().record(user_id, beat).await
    }

    pub async fn record_heartbeats(
        &self,
        user_id: Uuid,
        beats: Vec<NewHeartbeat>,
    ) -> Result<BatchOutcome, StoreError> {
        self.heartbeat_repo().record_many(user_id, beats).await
    }

    pub async fn get_heartbeat(&self, id: &str) -> Result<Option<Heartbeat>, StoreError> {
        self.heartbeat_repo().get(id).await
    }

    pub async fn find_heartbeat_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<Heartbeat>, StoreError> {
        self.heartbeat_repo().find_by_hash(hash).await
    }

    pub async fn list_heartbeats(
        &self,
        filter: &HeartbeatFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Heartbeat>, u64), StoreError> {
        self.heartbeat_repo().list(filter, page, page_size).await
    }

    pub async fn count_heartbeats(&self, filter: &HeartbeatFilter) -> Result<u64, StoreError> {
        self.heartbeat_repo().count(filter).await
    }

    pub async fn count_heartbeats_by(
        &self,
        user_id: Uuid,
        group: GroupBy,
    ) -> Result<Vec<(String, u64)>, StoreError> {
        self.heartbeat_repo().count_by(user_id, group).await
    }
}
