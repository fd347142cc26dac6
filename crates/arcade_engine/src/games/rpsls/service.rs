//! RPSLS move validation and application.
//!
//! There is no turn gate: each side submits once per round, in any order,
//! and the round resolves as soon as both slots are filled.

use tracing::{info, instrument};

use super::choice::{Choice, Resolution, RpslsState};
use crate::error::{EngineError, MoveError};
use crate::game::{Actor, Game, Side};
use crate::moves::{MoveData, MoveOutcome};
use crate::services::{self, GameService};
use crate::state::GameState;

/// RPSLS rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpslsService;

impl RpslsService {
    fn check(
        &self,
        game: &Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<(Side, Choice), MoveError> {
        services::ensure_playing(game)?;
        let side = services::side_of(game, actor)?;

        let choice = move_data
            .choice
            .as_deref()
            .and_then(|token| token.parse::<Choice>().ok())
            .ok_or_else(|| MoveError::rejected("Invalid choice"))?;

        if game.state().rpsls()?.choice_of(side).is_some() {
            return Err(MoveError::rejected("You have already chosen this round"));
        }
        Ok((side, choice))
    }

    fn apply(
        &self,
        game: &mut Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<MoveOutcome, MoveError> {
        let (side, choice) = self.check(game, actor, move_data)?;

        let mut state = game.state().rpsls()?.clone();
        state.set_choice(side, choice);
        let both = state.both();
        game.replace_state(GameState::Rpsls(state));

        let record = game.record_move(
            actor,
            MoveData::choice(choice.to_string()),
            format!("{} chose {}", actor.name(), choice.label()),
        );

        match both {
            Some((first, second)) => {
                let resolution = Resolution::of(first, second);
                info!(%first, %second, ?resolution, "Round resolved");
                let winner = match resolution {
                    Resolution::Tie => None,
                    Resolution::Winner(Side::Player1) => Some(*game.player1()),
                    // A bot win credits nobody.
                    Resolution::Winner(Side::Player2) => *game.player2(),
                };
                game.finish(winner);
            }
            None if !*actor.is_bot() => game.switch_turn(),
            None => {}
        }

        Ok(MoveOutcome::Accepted {
            record: Some(record),
            turn_passed: true,
        })
    }
}

impl GameService for RpslsService {
    #[instrument(skip(self, game), fields(game_id = *game.id()))]
    fn initialize_game(&self, game: &mut Game) {
        game.replace_state(GameState::Rpsls(RpslsState::default()));
    }

    fn valid_move(
        &self,
        game: &Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<bool, EngineError> {
        services::as_predicate(self.check(game, actor, move_data))
    }

    fn apply_move(
        &self,
        game: &mut Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<MoveOutcome, EngineError> {
        services::settle(self.apply(game, actor, move_data))
    }
}
