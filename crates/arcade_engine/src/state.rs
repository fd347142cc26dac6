//! Game-type tagged state blob.

use serde::{Deserialize, Serialize};

use crate::GameType;
use crate::error::EngineError;
use crate::games::battleship::BattleshipState;
use crate::games::rpsls::RpslsState;
use crate::games::tictactoe::TicTacToeState;

/// Per-game-type state, persisted as JSON.
///
/// The lifecycle controller never looks inside; each game service clones
/// its own variant, edits the clone and writes it back whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameState {
    /// Not yet initialized.
    #[default]
    Empty,
    /// Tic-tac-toe board.
    TicTacToe(TicTacToeState),
    /// RPSLS choices.
    Rpsls(RpslsState),
    /// Battleship boards and phase.
    Battleship(BattleshipState),
}

impl GameState {
    /// Returns the tic-tac-toe state or a mismatch error.
    pub fn tic_tac_toe(&self) -> Result<&TicTacToeState, EngineError> {
        match self {
            GameState::TicTacToe(state) => Ok(state),
            _ => Err(EngineError::StateMismatch(GameType::TicTacToe)),
        }
    }

    /// Returns the RPSLS state or a mismatch error.
    pub fn rpsls(&self) -> Result<&RpslsState, EngineError> {
        match self {
            GameState::Rpsls(state) => Ok(state),
            _ => Err(EngineError::StateMismatch(GameType::Rpsls)),
        }
    }

    /// Returns the battleship state or a mismatch error.
    pub fn battleship(&self) -> Result<&BattleshipState, EngineError> {
        match self {
            GameState::Battleship(state) => Ok(state),
            _ => Err(EngineError::StateMismatch(GameType::Battleship)),
        }
    }
}
