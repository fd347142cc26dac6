//! Service-level errors.

use arcade_engine::EngineError;
use derive_more::{Display, Error, From};

use crate::db::DbError;

/// Failure of an arcade operation.
///
/// Move rejections are not errors; they come back as
/// [`MoveResult`](arcade_engine::MoveResult) values. `Rejected` covers
/// requests outside a move (a taken username, a refused join).
#[derive(Debug, Clone, Display, Error, From)]
pub enum ArcadeError {
    /// Storage failure.
    #[display("{}", _0)]
    Db(DbError),

    /// Fatal engine fault.
    #[display("{}", _0)]
    Engine(EngineError),

    /// Unknown player or game id.
    #[from(ignore)]
    #[display("{} {} not found", kind, id)]
    NotFound {
        /// What was looked up.
        kind: &'static str,
        /// The id that matched nothing.
        id: i32,
    },

    /// Request refused by a business rule.
    #[from(ignore)]
    #[display("{}", _0)]
    Rejected(#[error(not(source))] String),
}

impl ArcadeError {
    /// Unknown player.
    pub fn player_not_found(id: i32) -> Self {
        Self::NotFound { kind: "Player", id }
    }

    /// Unknown game.
    pub fn game_not_found(id: i32) -> Self {
        Self::NotFound { kind: "Game", id }
    }

    /// Business-rule refusal.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

impl From<diesel::result::Error> for ArcadeError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::Db(DbError::from(err))
    }
}
