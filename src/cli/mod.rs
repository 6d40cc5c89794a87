//! CLI entry point for devflow.

pub mod auth;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// devflow CLI
#[derive(Parser, Debug)]
#[command(name = "devflow", version, about = "OAuth device authorization flow CLI")]
pub struct Cli {
    /// Path to the config file (default: ~/.devflow/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive device flow and cache the token
    Login,
    /// Print an access token, prompting only when no cached or refreshable token exists
    Token,
    /// Show the cached token status
    Status,
    /// Drop the cached token for the configured client
    Logout,
}
