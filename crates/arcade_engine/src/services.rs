//! Move validation and application, one service per game type.

use tracing::{debug, instrument, warn};

use crate::error::{EngineError, MoveError};
use crate::game::{Actor, Game, GameType, Side};
use crate::games::battleship::BattleshipService;
use crate::games::rpsls::RpslsService;
use crate::games::tictactoe::TicTacToeService;
use crate::moves::{MoveData, MoveOutcome};

/// Validator/applier for one game type.
pub trait GameService: Send + Sync {
    /// Writes the initial state blob. Called once, right after creation.
    fn initialize_game(&self, game: &mut Game);

    /// Pure predicate: would `apply_move` accept this payload right now?
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for faults such as an unknown action tag.
    fn valid_move(&self, game: &Game, actor: &Actor, move_data: &MoveData)
    -> Result<bool, EngineError>;

    /// Validates and applies a move.
    ///
    /// On acceptance the state blob is replaced in one step, at most one log
    /// entry is produced and the turn is advanced or the game finished.
    /// Rejections leave the game untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for faults such as an unknown action tag.
    fn apply_move(
        &self,
        game: &mut Game,
        actor: &Actor,
        move_data: &MoveData,
    ) -> Result<MoveOutcome, EngineError>;
}

static TIC_TAC_TOE: TicTacToeService = TicTacToeService;
static RPSLS: RpslsService = RpslsService;
static BATTLESHIP: BattleshipService = BattleshipService;

/// Returns the service for a game type.
pub fn service_for(game_type: GameType) -> &'static dyn GameService {
    match game_type {
        GameType::TicTacToe => &TIC_TAC_TOE,
        GameType::Rpsls => &RPSLS,
        GameType::Battleship => &BATTLESHIP,
    }
}

/// Initializes a freshly created game.
#[instrument(skip(game), fields(game_id = *game.id(), game_type = %game.game_type()))]
pub fn initialize_game(game: &mut Game) {
    service_for(*game.game_type()).initialize_game(game);
}

/// Checks a move against the game's rules without applying it.
///
/// # Errors
///
/// Returns [`EngineError`] on a fatal fault.
pub fn valid_move(game: &Game, actor: &Actor, move_data: &MoveData) -> Result<bool, EngineError> {
    service_for(*game.game_type()).valid_move(game, actor, move_data)
}

/// Validates and applies a move with the game's own service.
///
/// # Errors
///
/// Returns [`EngineError`] on a fatal fault.
#[instrument(
    skip(game, move_data),
    fields(game_id = *game.id(), actor = %actor.name(), bot = *actor.is_bot())
)]
pub fn apply_move(
    game: &mut Game,
    actor: &Actor,
    move_data: &MoveData,
) -> Result<MoveOutcome, EngineError> {
    let outcome = service_for(*game.game_type()).apply_move(game, actor, move_data)?;
    match &outcome {
        MoveOutcome::Accepted { record, turn_passed } => debug!(
            move_number = record.as_ref().map(|r| *r.move_number()),
            turn_passed,
            status = %game.status(),
            "Move accepted"
        ),
        MoveOutcome::Rejected { error } => warn!(error = %error, "Move rejected"),
    }
    Ok(outcome)
}

/// Folds an internal result into the public outcome.
pub(crate) fn settle(result: Result<MoveOutcome, MoveError>) -> Result<MoveOutcome, EngineError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(MoveError::Rejected(error)) => Ok(MoveOutcome::Rejected { error }),
        Err(MoveError::Fatal(err)) => Err(err),
    }
}

/// Folds an internal validation into a predicate.
pub(crate) fn as_predicate<T>(result: Result<T, MoveError>) -> Result<bool, EngineError> {
    match result {
        Ok(_) => Ok(true),
        Err(MoveError::Rejected(_)) => Ok(false),
        Err(MoveError::Fatal(err)) => Err(err),
    }
}

/// Moves are only accepted while playing.
pub(crate) fn ensure_playing(game: &Game) -> Result<(), MoveError> {
    if game.is_playing() {
        Ok(())
    } else {
        Err(MoveError::rejected("The game is not in progress"))
    }
}

/// Resolves which slot the actor plays.
pub(crate) fn side_of(game: &Game, actor: &Actor) -> Result<Side, MoveError> {
    if *actor.is_bot() {
        return if game.vs_bot() {
            Ok(Side::Player2)
        } else {
            Err(MoveError::rejected("This game has no bot opponent"))
        };
    }
    game.player_role(*actor.player_id())
        .ok_or_else(|| MoveError::rejected("You are not a participant in this game"))
}

/// Humans may only move on their own turn; the bot always may.
pub(crate) fn ensure_turn(game: &Game, actor: &Actor) -> Result<(), MoveError> {
    if *actor.is_bot() || *game.current_turn() == Some(*actor.player_id()) {
        Ok(())
    } else {
        Err(MoveError::rejected("Not your turn"))
    }
}

/// Winner to record for a side's victory: bots have no identity to credit.
pub(crate) fn winner_for(actor: &Actor) -> Option<crate::PlayerId> {
    if *actor.is_bot() {
        None
    } else {
        Some(*actor.player_id())
    }
}
