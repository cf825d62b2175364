//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod call;
mod config_cmd;
mod manifest;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "arcgis-connector")]
#[command(about = "Tool endpoints over ArcGIS portals, feature layers and map services")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: from settings)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the discovery manifest
    Manifest,

    /// Run one action against the live service and print the result
    Call {
        /// Action name, e.g. get_statistics or query_layer
        action: String,
        /// Request body as inline JSON
        #[arg(short, long, conflicts_with = "body_file")]
        body: Option<String>,
        /// Read the request body from a JSON file
        #[arg(long)]
        body_file: Option<PathBuf>,
    },

    /// Show the effective settings
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest => manifest::cmd_manifest(),
        command => {
            let settings = load_settings(cli.config.as_deref()).await?;
            match command {
                Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
                Commands::Call {
                    action,
                    body,
                    body_file,
                } => {
                    call::cmd_call(&settings, &action, body.as_deref(), body_file.as_deref())
                        .await
                }
                Commands::Config => config_cmd::cmd_config(&settings),
                Commands::Manifest => manifest::cmd_manifest(),
            }
        }
    }
}
