//! Tic-tac-toe move validation and application.

use tracing::{info, instrument};

use super::board::{Mark, TicTacToeState};
use crate::error::{EngineError, MoveError};
use crate::game::{Actor, Game};
use crate::moves::{MoveData, MoveOutcome};
use crate::services::{self, GameService};
use crate::state::GameState;

/// Tic-tac-toe rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToeService;

/// A move that passed validation.
struct Placement {
    position: usize,
    mark: Mark,
}

impl TicTacToeService {
    fn check(
        &self,
        game: &Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<Placement, MoveError> {
        services::ensure_playing(game)?;
        let side = services::side_of(game, actor)?;
        services::ensure_turn(game, actor)?;

        let position = move_data
            .position
            .and_then(|p| usize::try_from(p).ok())
            .filter(|p| *p < 9)
            .ok_or_else(|| MoveError::rejected("Position must be between 0 and 8"))?;

        let state = game.state().tic_tac_toe()?;
        if !state.board.is_empty(position) {
            return Err(MoveError::rejected("That square is already taken"));
        }

        Ok(Placement {
            position,
            mark: Mark::for_side(side),
        })
    }

    fn apply(
        &self,
        game: &mut Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<MoveOutcome, MoveError> {
        let Placement { position, mark } = self.check(game, actor, move_data)?;

        let mut state = game.state().tic_tac_toe()?.clone();
        state.board.set(position, mark);
        let board = state.board;
        game.replace_state(GameState::TicTacToe(state));

        let record = game.record_move(
            actor,
            MoveData::position(position as i64),
            format!("{} placed {} at position {}", actor.name(), mark, position + 1),
        );

        if board.has_line(mark) {
            info!(%mark, "Three in a row");
            game.finish(services::winner_for(actor));
        } else if board.is_full() {
            game.finish(None);
        } else {
            game.switch_turn();
        }

        Ok(MoveOutcome::Accepted {
            record: Some(record),
            turn_passed: true,
        })
    }
}

impl GameService for TicTacToeService {
    #[instrument(skip(self, game), fields(game_id = *game.id()))]
    fn initialize_game(&self, game: &mut Game) {
        game.replace_state(GameState::TicTacToe(TicTacToeState::default()));
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
