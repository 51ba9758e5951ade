pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, UserCommands};
pub use config::Config;
pub use db::{Heartbeat, Store, StoreError, User};
use models::HeartbeatFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config)?;

    info!(command = command_name(&cli.command), "Starting beatlog");

    match cli.command {
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }

        Commands::Migrate => cli::cmd_migrate(&config).await,

        Commands::User { command } => match command {
            UserCommands::Add { username, password } => {
                cli::cmd_user_add(&config, &username, &password).await
            }
            UserCommands::List { json } => cli::cmd_user_list(&config, json).await,
            UserCommands::Promote { username } => {
                cli::cmd_user_admin(&config, &username, true).await
            }
            UserCommands::Demote { username } => {
                cli::cmd_user_admin(&config, &username, false).await
            }
            UserCommands::RotateKey { username } => {
                cli::cmd_user_rotate_key(&config, &username).await
            }
            UserCommands::Delete { username } => cli::cmd_user_delete(&config, &username).await,
        },

        Commands::Heartbeats {
            username,
            entity,
            domain,
            page,
            page_size,
        } => {
            let filter = HeartbeatFilter {
                entity,
                domain,
                ..Default::default()
            };
            cli::cmd_heartbeat_list(&config, &username, filter, page, page_size).await
        }

        Commands::Stats { username, by, json } => {
            cli::cmd_stats(&config, &username, by, json).await
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}

const fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Migrate => "migrate",
        Commands::User { .. } => "user",
        Commands::Heartbeats { .. } => "heartbeats",
        Commands::Stats { .. } => "stats",
    }
}
