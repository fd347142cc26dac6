//! Arcade engine - rules, turn lifecycle and bots for three turn-based games
//!
//! The engine is pure: it validates and applies moves against an in-memory
//! [`Game`], produces move-log records and counter settlements, and leaves
//! storage, locking and transport to the caller.
//!
//! # Architecture
//!
//! - **Game**: the shared envelope (status, players, turn, winner) and its
//!   lifecycle controller
//! - **Services**: one [`GameService`] per game type, picked by [`service_for`]
//! - **Bots**: one [`Bot`] per game type, dispatched by [`bot_move`]
//!
//! # Example
//!
//! ```
//! use arcade_engine::{Actor, Game, GameType, MoveData, apply_move, initialize_game};
//!
//! # fn example() -> Result<(), arcade_engine::EngineError> {
//! let mut game = Game::new(1, GameType::TicTacToe, 10, None);
//! initialize_game(&mut game);
//! game.join(20);
//!
//! let outcome = apply_move(&mut game, &Actor::human(10, "alice"), &MoveData::position(4))?;
//! assert!(outcome.is_accepted());
//! assert_eq!(*game.current_turn(), Some(20));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod bots;
mod error;
mod game;
mod games;
mod moves;
mod services;
mod state;

// Crate-level exports - Envelope and lifecycle
pub use game::{Actor, Game, GameId, GameSnapshot, GameStatus, GameType, PlayerId, Settlement, Side};

// Crate-level exports - Moves
pub use moves::{MoveData, MoveOutcome, MoveResult, NewGameMove};

// Crate-level exports - State and errors
pub use error::EngineError;
pub use state::GameState;

// Crate-level exports - Services
pub use services::{GameService, apply_move, initialize_game, service_for, valid_move};

// Crate-level exports - Bots
pub use bots::{Bot, BotContext, Difficulty, bot_move};

// Crate-level exports - Tic-tac-toe
pub use games::tictactoe::{
    Board, Mark, Square, TicTacToeBot, TicTacToeService, TicTacToeState, WINNING_LINES,
};

// Crate-level exports - RPSLS
pub use games::rpsls::{Choice, Resolution, RpslsBot, RpslsService, RpslsState};

// Crate-level exports - Battleship
pub use games::battleship::{
    BOARD_SIZE, BattleshipBot, BattleshipService, BattleshipState, Coord, Grid, Orientation,
    PLACEMENT_ATTEMPTS, Phase, PlacementError, RANDOM_PLACE_ATTEMPTS, ShipType, Shot, SideBoard,
    neighbors, ship_cells,
};
