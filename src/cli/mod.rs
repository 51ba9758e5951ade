//! CLI module - operator commands for Beatlog
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::models::GroupBy;

/// Beatlog - heartbeat store for web analytics
#[derive(Parser)]
#[command(name = "beatlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    Init,

    /// Create or upgrade the database schema
    Migrate,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// List a user's heartbeats, newest first
    #[command(alias = "hb")]
    Heartbeats {
        /// Owner of the heartbeats
        username: String,
        /// Only heartbeats for this entity
        #[arg(long)]
        entity: Option<String>,
        /// Only heartbeats for this domain
        #[arg(long)]
        domain: Option<String>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u64,
        /// Heartbeats per page
        #[arg(long, default_value = "20")]
        page_size: u64,
    },

    /// Show heartbeat counts for a user grouped by a column
    Stats {
        /// Owner of the heartbeats
        username: String,
        /// Column to group on (entity, type, category, browser, domain, path)
        #[arg(long, default_value = "domain")]
        by: GroupBy,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Add {
        /// Username
        username: String,
        /// Plaintext password (hashed before it is stored)
        #[arg(long)]
        password: String,
    },
    /// List users
    #[command(alias = "ls")]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Grant admin rights
    Promote {
        /// Username
        username: String,
    },
    /// Revoke admin rights
    Demote {
        /// Username
        username: String,
    },
    /// Replace the user's API key
    RotateKey {
        /// Username
        username: String,
    },
    /// Delete a user and all of its heartbeats
    #[command(alias = "rm")]
    Delete {
        /// Username
        username: String,
    },
}

pub use commands::*;
