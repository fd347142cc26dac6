//! Database persistence layer for players, games and the move log.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

// Crate-level exports - Persistence
pub use error::DbError;
pub use models::{GameChanges, GameMove, GameRow, NewGameMoveRow, NewGameRow, NewPlayer, Player};
pub use repository::{
    FINISHED_GAMES_LIMIT, GameRepository, LEADERBOARD_LIMIT, MIGRATIONS, RPSLS_HISTORY_LIMIT,
};
