//! CLI argument definitions using clap
//!
//! Commands:
//! - aerocrud serve [--config <path>] [--port <port>]
//! - aerocrud routes [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aerocrud - schema-driven CRUD endpoints over pluggable storage and cache
#[derive(Parser, Debug)]
#[command(name = "aerocrud")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the demo resources on in-memory storage and cache
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the routes the demo resources would mount, as JSON
    Routes {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
