//! Arcade - CLI entry point
//!
//! Serves the HTTP API, applies migrations or prints the leaderboard.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use arcade::{ArcadeConfig, ArcadeService, GameRepository, PlayerStats, router};
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (host, port) = match &cli.command {
        Command::Serve { host, port } => (host.clone(), *port),
        Command::Migrate | Command::Leaderboard => (None, None),
    };
    let config =
        ArcadeConfig::resolve(cli.config.as_deref(), cli.database_url.clone(), host, port)?;
    initialize_tracing(config.log_filter());

    match cli.command {
        Command::Serve { .. } => run_server(config).await,
        Command::Migrate => run_migrate(&config),
        Command::Leaderboard => run_leaderboard(&config),
    }
}

fn initialize_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the HTTP game server
#[instrument(skip(config), fields(address = %config.bind_address()))]
async fn run_server(config: ArcadeConfig) -> Result<()> {
    let service = ArcadeService::from_config(&config)?;
    let applied = service.repository().run_migrations()?;
    info!(applied, database = %config.database_url(), "Database ready");

    let app = router(service);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Arcade listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

/// Apply pending migrations
fn run_migrate(config: &ArcadeConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_url().clone())?;
    let applied = repository.run_migrations()?;
    println!("Applied {} migration(s) to {}", applied, config.database_url());
    Ok(())
}

/// Print the leaderboard
fn run_leaderboard(config: &ArcadeConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_url().clone())?;
    let players = repository.leaderboard()?;
    if players.is_empty() {
        println!("No players yet");
        return Ok(());
    }
    println!(
        "{:<4} {:<20} {:>5} {:>6} {:>5} {:>7}",
        "#", "Player", "Wins", "Losses", "Draws", "Win %"
    );
    for (rank, player) in players.iter().enumerate() {
        let stats = PlayerStats::from(player);
        println!(
            "{:<4} {:<20} {:>5} {:>6} {:>5} {:>6.1}%",
            rank + 1,
            stats.username,
            stats.wins_count,
            stats.losses_count,
            stats.draws_count,
            stats.win_rate
        );
    }
    Ok(())
}
