//! The arcade service: serialized move application, bot turns and events.
//!
//! Every state change of a game goes through the same path: take the game's
//! lock, run load → apply → commit in one immediate transaction, then
//! publish the new snapshot. Bot moves use that path too, acting through the
//! human owner of the game.

use arcade_engine::{
    Actor, BotContext, Difficulty, Game, GameId, GameSnapshot, GameState, GameType, Mark, MoveData,
    MoveOutcome, MoveResult, NewGameMove, Phase, PlayerId, Side, apply_move, bot_move,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ArcadeConfig;
use crate::db::{GameMove, GameRepository, Player};
use crate::error::ArcadeError;
use crate::events::{GameEvent, GameEvents};
use crate::locks::GameLocks;

/// Shortest accepted username.
pub const USERNAME_MIN: usize = 3;

/// Longest accepted username.
pub const USERNAME_MAX: usize = 20;

/// A persisted move with its payload decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveView {
    /// Row id.
    pub id: i32,
    /// Acting slot owner.
    pub player_id: PlayerId,
    /// Position in the game's log, from 1.
    pub move_number: i32,
    /// Decoded payload.
    pub move_data: MoveData,
    /// Human-readable description.
    pub description: String,
    /// Set for moves the bot made.
    pub by_bot: bool,
    /// Insert time.
    pub created_at: NaiveDateTime,
}

impl TryFrom<&GameMove> for MoveView {
    type Error = ArcadeError;

    fn try_from(row: &GameMove) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *row.id(),
            player_id: *row.player_id(),
            move_number: *row.move_number(),
            move_data: row.payload()?,
            description: row.description().clone(),
            by_bot: *row.by_bot(),
            created_at: *row.created_at(),
        })
    }
}

/// Game orchestration over the repository, the lock table and the event hub.
#[derive(Debug, Clone)]
pub struct ArcadeService {
    repository: GameRepository,
    locks: GameLocks,
    events: GameEvents,
    max_bot_steps: usize,
}

impl ArcadeService {
    /// Creates a service.
    #[instrument(skip(repository, events))]
    pub fn new(repository: GameRepository, events: GameEvents, max_bot_steps: usize) -> Self {
        info!("Creating ArcadeService");
        Self {
            repository,
            locks: GameLocks::new(),
            events,
            max_bot_steps,
        }
    }

    /// Creates a service from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError`] if the repository cannot be created.
    pub fn from_config(config: &ArcadeConfig) -> Result<Self, ArcadeError> {
        let repository = GameRepository::new(config.database_url().clone())?;
        Ok(Self::new(
            repository,
            GameEvents::new(*config.event_capacity()),
            *config.max_bot_steps(),
        ))
    }

    /// The underlying repository.
    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    /// The event hub.
    pub fn events(&self) -> &GameEvents {
        &self.events
    }

    /// Registers a new player.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::Rejected`] for a username of the wrong length
    /// or one already taken.
    #[instrument(skip(self))]
    pub fn register_player(&self, username: &str) -> Result<Player, ArcadeError> {
        let username = username.trim();
        let length = username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
            return Err(ArcadeError::rejected(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN, USERNAME_MAX
            )));
        }
        if self.repository.find_player_by_username(username)?.is_some() {
            return Err(ArcadeError::rejected("Username is already taken"));
        }
        Ok(self.repository.create_player(username)?)
    }

    /// Looks up a player.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown id.
    pub fn player(&self, player_id: PlayerId) -> Result<Player, ArcadeError> {
        self.repository
            .find_player(player_id)?
            .ok_or_else(|| ArcadeError::player_not_found(player_id))
    }

    /// The leaderboard, most wins first.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError`] on a storage failure.
    pub fn leaderboard(&self) -> Result<Vec<Player>, ArcadeError> {
        Ok(self.repository.leaderboard()?)
    }

    /// Creates a game owned by `player_id`. A bot game starts immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown player.
    #[instrument(skip(self))]
    pub fn create_game(
        &self,
        player_id: PlayerId,
        game_type: GameType,
        bot_difficulty: Option<Difficulty>,
    ) -> Result<GameSnapshot, ArcadeError> {
        self.player(player_id)?;
        let game = self.repository.create_game(game_type, player_id, bot_difficulty)?;
        let snapshot = game.snapshot();

        self.events.publish(GameEvent::GameCreated {
            game: snapshot.clone(),
        });
        if game.is_playing() {
            self.events.publish(GameEvent::GameStarted {
                game: snapshot.clone(),
            });
        }
        Ok(snapshot)
    }

    /// Seats `player_id` as the second player and starts the game.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown game or player and
    /// [`ArcadeError::Rejected`] when the game cannot be joined.
    #[instrument(skip(self))]
    pub fn join_game(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<GameSnapshot, ArcadeError> {
        self.player(player_id)?;
        self.locks.with_game(game_id, || -> Result<GameSnapshot, ArcadeError> {
            let (game, joined) = self
                .repository
                .join_game(game_id, player_id)?
                .ok_or_else(|| ArcadeError::game_not_found(game_id))?;
            if !joined {
                return Err(ArcadeError::rejected("Cannot join this game"));
            }
            let snapshot = game.snapshot();
            self.events.publish(GameEvent::GameStarted {
                game: snapshot.clone(),
            });
            Ok(snapshot)
        })
    }

    /// Applies a human move, then lets the bot answer in a bot game.
    ///
    /// The returned result describes the human move only. A failing bot turn
    /// is logged and does not undo the accepted human move.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown game or player and
    /// other variants for storage or engine faults. Rule violations come back
    /// as an unsuccessful [`MoveResult`].
    #[instrument(skip(self, move_data))]
    pub fn submit_move(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        move_data: MoveData,
    ) -> Result<MoveResult, ArcadeError> {
        let player = self.player(player_id)?;
        let actor = Actor::human(player_id, player.username().clone());

        self.locks.with_game(game_id, || -> Result<MoveResult, ArcadeError> {
            let (game, outcome) = self
                .repository
                .commit_move(game_id, |game| {
                    apply_move(game, &actor, &move_data).map_err(ArcadeError::from)
                })?
                .ok_or_else(|| ArcadeError::game_not_found(game_id))?;

            if let MoveOutcome::Accepted { record, .. } = &outcome {
                self.announce(&game, record.clone());
                if let Err(e) = self.drive_bot(game) {
                    error!(game_id, error = %e, "Bot turn failed");
                }
            }
            Ok(MoveResult::from(outcome))
        })
    }

    /// Lets the bot move while it is its turn; returns the number of bot moves.
    ///
    /// Resumes a bot turn that an earlier failure or the step limit cut short.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown game.
    #[instrument(skip(self))]
    pub fn play_bot_turns(&self, game_id: GameId) -> Result<usize, ArcadeError> {
        self.locks.with_game(game_id, || -> Result<usize, ArcadeError> {
            let game = self
                .repository
                .load_game(game_id)?
                .ok_or_else(|| ArcadeError::game_not_found(game_id))?;
            self.drive_bot(game)
        })
    }

    /// Current snapshot of a game.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown game.
    pub fn game(&self, game_id: GameId) -> Result<GameSnapshot, ArcadeError> {
        Ok(self
            .repository
            .load_game(game_id)?
            .ok_or_else(|| ArcadeError::game_not_found(game_id))?
            .snapshot())
    }

    /// Move history of a game, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown game.
    pub fn moves(&self, game_id: GameId) -> Result<Vec<MoveView>, ArcadeError> {
        self.game(game_id)?;
        self.repository
            .list_moves(game_id)?
            .iter()
            .map(MoveView::try_from)
            .collect()
    }

    /// Games waiting for an opponent.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError`] on a storage failure.
    pub fn waiting_games(&self) -> Result<Vec<GameSnapshot>, ArcadeError> {
        Ok(self.repository.waiting_games()?)
    }

    /// A player's finished games.
    ///
    /// # Errors
    ///
    /// Returns [`ArcadeError::NotFound`] for an unknown player.
    pub fn finished_games(&self, player_id: PlayerId) -> Result<Vec<GameSnapshot>, ArcadeError> {
        self.player(player_id)?;
        Ok(self.repository.finished_games(player_id)?)
    }

    /// Runs bot moves until it is no longer the bot's turn. The caller holds
    /// the game's lock.
    #[instrument(skip(self, game), fields(game_id = *game.id()))]
    fn drive_bot(&self, mut game: Game) -> Result<usize, ArcadeError> {
        let Some(difficulty) = *game.bot_difficulty() else {
            return Ok(0);
        };
        let game_id = *game.id();
        let proxy = *game.player1();
        let mut steps = 0;

        while bot_due(&game) {
            if steps >= self.max_bot_steps {
                warn!(steps, "Bot step limit reached");
                break;
            }
            let context = self.bot_context(&game)?;
            let mut chosen = MoveData::default();
            let (next, outcome) = self
                .repository
                .commit_move(game_id, |game| {
                    chosen = bot_move(game, difficulty, &context, &mut rand::rng())?;
                    apply_move(game, &Actor::bot(proxy), &chosen).map_err(ArcadeError::from)
                })?
                .ok_or_else(|| ArcadeError::game_not_found(game_id))?;
            steps += 1;

            match &outcome {
                MoveOutcome::Accepted { record, .. } => self.announce(&next, record.clone()),
                MoveOutcome::Rejected { error } => {
                    warn!(error = %error, ?chosen, "Bot move rejected");
                    break;
                }
            }
            game = next;
        }

        debug!(steps, status = %game.status(), "Bot done");
        Ok(steps)
    }

    fn bot_context(&self, game: &Game) -> Result<BotContext, ArcadeError> {
        let recent_opponent_moves = match game.game_type() {
            GameType::Rpsls => self
                .repository
                .recent_rpsls_choices(*game.player1(), *game.id())?,
            GameType::TicTacToe | GameType::Battleship => Vec::new(),
        };
        Ok(BotContext {
            recent_opponent_moves,
        })
    }

    fn announce(&self, game: &Game, record: Option<NewGameMove>) {
        let snapshot = game.snapshot();
        self.events.publish(GameEvent::MoveMade {
            game: snapshot.clone(),
            record,
        });
        if game.is_finished() {
            self.events.publish(GameEvent::GameFinished { game: snapshot });
        }
    }
}

/// Whether the bot owes a move in `game`.
pub fn bot_due(game: &Game) -> bool {
    if !game.is_playing() || !game.vs_bot() {
        return false;
    }
    match game.state() {
        GameState::TicTacToe(state) => state.board.count(Mark::O) < state.board.count(Mark::X),
        GameState::Rpsls(state) => state.choice_of(Side::Player2).is_none(),
        GameState::Battleship(state) => match state.phase {
            Phase::Placement => !state.side(Side::Player2).ready,
            Phase::Battle => state.bot_to_fire,
        },
        GameState::Empty => false,
    }
}
