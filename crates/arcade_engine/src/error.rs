//! Engine error types.
//!
//! Player mistakes never show up here: they are reported as
//! [`MoveOutcome::Rejected`](crate::MoveOutcome) values. [`EngineError`] is
//! reserved for faults that point at a bug or misconfiguration upstream.

use crate::GameType;

/// Fatal engine fault.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EngineError {
    /// A stored game type string matches none of the known games.
    #[display("Unknown game type: {}", _0)]
    UnknownGameType(#[error(not(source))] String),

    /// A battleship payload named an action the engine does not know.
    #[display("Unknown action: {}", _0)]
    UnknownAction(#[error(not(source))] String),

    /// The state blob belongs to a different game type than the envelope.
    #[display("State does not match game type {}", _0)]
    StateMismatch(#[error(not(source))] GameType),

    /// The bot was asked to move in a position where it has nothing to play.
    #[display("Bot has no legal move in a {} game", _0)]
    NoLegalMove(#[error(not(source))] GameType),
}

/// Internal failure of a single move attempt.
///
/// `Rejected` carries the player-facing message and leaves state untouched;
/// `Fatal` bubbles out of the public API as an [`EngineError`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub(crate) enum MoveError {
    /// Validation rejection.
    #[display("{}", _0)]
    Rejected(String),
    /// Programming or configuration fault.
    #[display("{}", _0)]
    Fatal(EngineError),
}

impl MoveError {
    /// Builds a rejection from any message.
    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

impl From<EngineError> for MoveError {
    fn from(err: EngineError) -> Self {
        Self::Fatal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn engine_errors_are_leaf_errors() {
        let err = EngineError::UnknownAction("surrender".into());
        assert!(err.source().is_none());
        let boxed: Box<dyn std::error::Error> = Box::new(EngineError::NoLegalMove(GameType::Rpsls));
        assert_eq!(boxed.to_string(), "Bot has no legal move in a rpsls game");
    }
}
