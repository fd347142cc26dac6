//! Bot decision layer.
//!
//! A bot only produces a payload. The caller feeds it back through
//! [`apply_move`](crate::apply_move) with [`Actor::bot`](crate::Actor::bot),
//! under the same lock as human moves.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::EngineError;
use crate::game::{Game, GameType};
use crate::games::battleship::BattleshipBot;
use crate::games::rpsls::RpslsBot;
use crate::games::tictactoe::TicTacToeBot;
use crate::moves::MoveData;

/// Bot strength. Harder bots roll random moves less often.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Mostly random.
    Easy,
    /// Even odds.
    #[default]
    Medium,
    /// Mostly heuristic.
    Hard,
}

impl Difficulty {
    /// Rolls for a random move with the probability for this tier.
    pub fn roll(self, rng: &mut dyn RngCore, easy: f64, medium: f64, hard: f64) -> bool {
        let chance = match self {
            Difficulty::Easy => easy,
            Difficulty::Medium => medium,
            Difficulty::Hard => hard,
        };
        rng.random_bool(chance)
    }
}

/// Read-only inputs a bot may consult besides the game itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotContext {
    /// The human opponent's recent payloads, newest first.
    pub recent_opponent_moves: Vec<MoveData>,
}

/// Chooses a move for the bot side of a game.
pub trait Bot {
    /// Produces a payload shaped like the equivalent human move.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoLegalMove`] when the bot has nothing to play
    /// and [`EngineError::StateMismatch`] for a state of the wrong type.
    fn choose(
        &self,
        game: &Game,
        context: &BotContext,
        rng: &mut dyn RngCore,
    ) -> Result<MoveData, EngineError>;
}

/// Produces the bot's next payload for `game`.
///
/// # Errors
///
/// See [`Bot::choose`].
#[instrument(skip(game, context, rng), fields(game_id = *game.id(), game_type = %game.game_type()))]
pub fn bot_move(
    game: &Game,
    difficulty: Difficulty,
    context: &BotContext,
    rng: &mut dyn RngCore,
) -> Result<MoveData, EngineError> {
    match game.game_type() {
        GameType::TicTacToe => TicTacToeBot::new(difficulty).choose(game, context, rng),
        GameType::Rpsls => RpslsBot::new(difficulty).choose(game, context, rng),
        GameType::Battleship => BattleshipBot::new(difficulty).choose(game, context, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn difficulty_tokens() {
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(Difficulty::Easy.to_string(), "easy");
        assert_eq!(
            serde_json::to_string(&Difficulty::Medium).unwrap(),
            "\"medium\""
        );
    }

    #[test]
    fn roll_extremes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Difficulty::Easy.roll(&mut rng, 1.0, 0.0, 0.0));
        assert!(!Difficulty::Hard.roll(&mut rng, 1.0, 1.0, 0.0));
    }

    #[test]
    fn bot_move_needs_initialized_state() {
        let game = Game::new(1, GameType::TicTacToe, 1, Some(Difficulty::Easy));
        let mut rng = StdRng::seed_from_u64(0);
        let err = bot_move(&game, Difficulty::Easy, &BotContext::default(), &mut rng).unwrap_err();
        assert_eq!(err, EngineError::StateMismatch(GameType::TicTacToe));
    }
}
