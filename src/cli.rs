//! Command-line interface for the arcade server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Arcade - turn-based game server for tic-tac-toe, RPSLS and battleship
#[derive(Parser, Debug)]
#[command(name = "arcade")]
#[command(about = "Turn-based game server with bots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides config and DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Apply pending database migrations
    Migrate,

    /// Print the leaderboard
    Leaderboard,
}
