//! Arcade - turn-based game server
//!
//! Persists players, games and the move log in SQLite, applies moves through
//! the `arcade_engine` rules one game at a time, plays the bot side of bot
//! games and streams game events over HTTP.
//!
//! # Architecture
//!
//! - **Db**: diesel repository with one immediate transaction per change
//! - **Service**: per-game locking, bot turns and event publishing
//! - **Http**: axum routes and server-sent events
//!
//! # Example
//!
//! ```no_run
//! use arcade::{ArcadeConfig, ArcadeService, router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ArcadeConfig::default();
//! let service = ArcadeService::from_config(&config)?;
//! service.repository().run_migrations()?;
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, router(service)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod error;
mod events;
mod http;
mod locks;
mod service;

// Crate-level exports - Configuration
pub use config::{ArcadeConfig, ConfigError};

// Crate-level exports - Persistence
pub use db::{
    DbError, FINISHED_GAMES_LIMIT, GameMove, GameRepository, LEADERBOARD_LIMIT, MIGRATIONS, Player,
    RPSLS_HISTORY_LIMIT,
};

// Crate-level exports - Service
pub use error::ArcadeError;
pub use events::{GameEvent, GameEvents};
pub use locks::GameLocks;
pub use service::{ArcadeService, MoveView, USERNAME_MAX, USERNAME_MIN, bot_due};

// Crate-level exports - HTTP
pub use http::{
    ApiError, CreateGameRequest, CreatePlayerRequest, ErrorResponse, JoinGameRequest, PlayerStats,
    SubmitMoveRequest, router,
};
