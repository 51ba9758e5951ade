//! Heartbeat inspection command handlers

use super::open_store;
use crate::config::Config;
use crate::models::{GroupBy, HeartbeatFilter};
use crate::services::{HeartbeatService, SeaOrmHeartbeatService};

pub async fn cmd_heartbeat_list(
    config: &Config,
    username: &str,
    filter: HeartbeatFilter,
    page: u64,
    page_size: u64,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    let Some(user) = store.get_user_by_username(username).await? else {
        println!("User '{username}' not found.");
        return Ok(());
    };

    let service = SeaOrmHeartbeatService::new(store);
    let filter = HeartbeatFilter {
        user_id: Some(user.id),
        ..filter
    };
    let result = service.list(&filter, page, page_size).await?;

    if result.items.is_empty() {
        println!("No heartbeats recorded for {}.", user.username);
        return Ok(());
    }

    println!(
        "Heartbeats for {} (page {}/{})",
        user.username, result.page, result.total_pages
    );
    println!("{:-<90}", "");

    for beat in result.items {
        let time = beat
            .time
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        println!(
            "{:<19}  {:<12} {:<10} {}{}",
            time, beat.entity, beat.kind, beat.domain, beat.path
        );
    }

    Ok(())
}

pub async fn cmd_stats(
    config: &Config,
    username: &str,
    group: GroupBy,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    let Some(user) = store.get_user_by_username(username).await? else {
        println!("User '{username}' not found.");
        return Ok(());
    };

    let service = SeaOrmHeartbeatService::new(store);
    let counts = service.count_by(user.id, group).await?;

    if json {
        let rows: Vec<serde_json::Value> = counts
            .iter()
            .map(|(value, hits)| {
                let mut row = serde_json::Map::new();
                row.insert(group.as_str().to_string(), value.clone().into());
                row.insert("count".to_string(), (*hits).into());
                serde_json::Value::Object(row)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if counts.is_empty() {
        println!("No heartbeats recorded for {}.", user.username);
        return Ok(());
    }

    let total: u64 = counts.iter().map(|(_, hits)| hits).sum();
    println!("Heartbeats for {} by {} ({} total)", user.username, group, total);
    println!("{:-<70}", "");

    for (value, hits) in counts {
        let label = if value.is_empty() { "(empty)" } else { value.as_str() };
        println!("{label:<56} {hits:>12}");
    }

    Ok(())
}
