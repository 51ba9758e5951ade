mod heartbeats;
mod user;

pub use heartbeats::{cmd_heartbeat_list, cmd_stats};
pub use user::{cmd_user_add, cmd_user_admin, cmd_user_delete, cmd_user_list, cmd_user_rotate_key};

use crate::config::{Config, SecurityConfig};
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

pub async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    store.ping().await?;
    println!("✓ Database schema is up to date: {}", config.general.database_path);
    Ok(())
}

fn auth_service(store: Store, security: &SecurityConfig) -> impl AuthService {
    SeaOrmAuthService::new(store, security.clone())
}
