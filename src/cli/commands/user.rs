//! User management command handlers

use anyhow::Context;

use super::{auth_service, open_store};
use crate::config::Config;
use crate::services::{AuthError, AuthService};

pub async fn cmd_user_add(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let auth = auth_service(store, &config.security);

    match auth.register_with_password(username, password).await {
        Ok(user) => {
            println!("✓ Created user: {}", user.username);
            println!("  ID:      {}", user.id);
            println!("  API key: {}", user.api_key);
            Ok(())
        }
        Err(AuthError::Conflict(_)) => {
            println!("User '{username}' already exists.");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to create user"),
    }
}

pub async fn cmd_user_list(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let auth = auth_service(store, &config.security);
    let users = auth.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users registered.");
        println!();
        println!("Add one with: beatlog user add <username> --password <password>");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let role = if user.is_admin { "admin" } else { "user" };
        println!(
            "{:<24} {:<6} last login {}",
            user.username,
            role,
            user.last_login.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}

pub async fn cmd_user_admin(config: &Config, username: &str, is_admin: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let auth = auth_service(store, &config.security);

    let Some(user) = find_user(&auth, username).await? else {
        return Ok(());
    };

    let user = auth.set_admin(user.id, is_admin).await?;
    if user.is_admin {
        println!("✓ {} is now an admin", user.username);
    } else {
        println!("✓ {} is no longer an admin", user.username);
    }

    Ok(())
}

pub async fn cmd_user_rotate_key(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let auth = auth_service(store, &config.security);

    let Some(user) = find_user(&auth, username).await? else {
        return Ok(());
    };

    let api_key = auth.regenerate_api_key(user.id).await?;
    println!("✓ New API key for {}: {}", user.username, api_key);

    Ok(())
}

pub async fn cmd_user_delete(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let auth = auth_service(store, &config.security);

    let Some(user) = find_user(&auth, username).await? else {
        return Ok(());
    };

    println!(
        "Delete '{}' and all of its heartbeats? Enter 'y' to confirm, anything else to cancel:",
        user.username
    );

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("y") {
        auth.delete_user(user.id).await?;
        println!("✓ Deleted: {}", user.username);
    } else {
        println!("Cancelled.");
    }

    Ok(())
}

async fn find_user(
    auth: &impl AuthService,
    username: &str,
) -> anyhow::Result<Option<crate::db::User>> {
    match auth.get_user_by_username(username).await {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::NotFound) => {
            println!("User '{username}' not found.");
            println!("Use 'beatlog user list' to see users.");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
