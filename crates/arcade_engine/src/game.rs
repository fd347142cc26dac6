//! The game envelope and its turn/lifecycle controller.
//!
//! [`Game`] owns the shared fields every game type has (status, players,
//! whose turn it is, the winner) plus an opaque [`GameState`]. The lifecycle
//! methods here only ever touch the envelope; the per-type services own the
//! state blob.

use chrono::{NaiveDateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::bots::Difficulty;
use crate::moves::{MoveData, NewGameMove};
use crate::state::GameState;

/// Database identifier of a player.
pub type PlayerId = i32;

/// Database identifier of a game.
pub type GameId = i32;

/// The three supported games.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameType {
    /// Classic 3x3 noughts and crosses.
    TicTacToe,
    /// Rock-Paper-Scissors-Lizard-Spock, one simultaneous round.
    Rpsls,
    /// Ten-ship battleship on a 10x10 grid.
    Battleship,
}

impl GameType {
    /// Human-readable name for listings.
    pub fn display_name(self) -> &'static str {
        match self {
            GameType::TicTacToe => "Tic-Tac-Toe",
            GameType::Rpsls => "Rock-Paper-Scissors-Lizard-Spock",
            GameType::Battleship => "Battleship",
        }
    }
}

/// Lifecycle status. Only ever moves forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameStatus {
    /// Created, waiting for an opponent.
    Waiting,
    /// Both slots filled, moves accepted.
    Playing,
    /// Terminal.
    Finished,
}

/// Which of the two slots of a game a move acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The game owner.
    Player1,
    /// The joined opponent, or the bot.
    Player2,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }
}

/// Who submits a move.
///
/// A bot has no player identity of its own: it acts through the human slot
/// owner (`player_id` is player1) and always plays the second slot.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Actor {
    player_id: PlayerId,
    name: String,
    is_bot: bool,
}

impl Actor {
    /// Display name used for the bot in move descriptions.
    pub const BOT_NAME: &'static str = "Bot";

    /// A human participant.
    pub fn human(player_id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
            is_bot: false,
        }
    }

    /// The bot, acting on behalf of the human owning `proxy`.
    pub fn bot(proxy: PlayerId) -> Self {
        Self {
            player_id: proxy,
            name: Self::BOT_NAME.to_string(),
            is_bot: true,
        }
    }
}

/// Player counter changes produced by [`Game::finish`].
///
/// Applied by the persistence layer in the same transaction as the status
/// write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// `winner` gains a win, `loser` (if any) a loss.
    Win {
        /// Credited with a win.
        winner: PlayerId,
        /// Credited with a loss.
        loser: Option<PlayerId>,
    },
    /// Every listed player gains a draw.
    Draw {
        /// Human participants of the game.
        players: Vec<PlayerId>,
    },
}

/// Plain view of a game, used to restore it from storage and to broadcast it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game id.
    pub id: GameId,
    /// Game type.
    pub game_type: GameType,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Owner.
    pub player1: PlayerId,
    /// Joined opponent.
    pub player2: Option<PlayerId>,
    /// Player whose turn it is.
    pub current_turn: Option<PlayerId>,
    /// Winner; `None` on a finished game means a draw (or a bot win).
    pub winner: Option<PlayerId>,
    /// Set when the second slot is played by a bot.
    pub bot_difficulty: Option<Difficulty>,
    /// Game-type specific state.
    pub state: GameState,
    /// When play started.
    pub started_at: Option<NaiveDateTime>,
    /// When the game finished.
    pub finished_at: Option<NaiveDateTime>,
}

/// A game and its lifecycle.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Game {
    id: GameId,
    game_type: GameType,
    status: GameStatus,
    player1: PlayerId,
    player2: Option<PlayerId>,
    current_turn: Option<PlayerId>,
    winner: Option<PlayerId>,
    bot_difficulty: Option<Difficulty>,
    state: GameState,
    started_at: Option<NaiveDateTime>,
    finished_at: Option<NaiveDateTime>,
    /// Highest move number already in the log.
    last_move_number: i32,
    #[getter(skip)]
    settlement: Option<Settlement>,
}

impl Game {
    /// Creates a fresh waiting game owned by `player1`.
    ///
    /// The state stays [`GameState::Empty`] until the game service
    /// initializes it.
    #[instrument]
    pub fn new(
        id: GameId,
        game_type: GameType,
        player1: PlayerId,
        bot_difficulty: Option<Difficulty>,
    ) -> Self {
        Self {
            id,
            game_type,
            status: GameStatus::Waiting,
            player1,
            player2: None,
            current_turn: None,
            winner: None,
            bot_difficulty,
            state: GameState::Empty,
            started_at: None,
            finished_at: None,
            last_move_number: 0,
            settlement: None,
        }
    }

    /// Rebuilds a game from storage.
    pub fn restore(snapshot: GameSnapshot, last_move_number: i32) -> Self {
        Self {
            id: snapshot.id,
            game_type: snapshot.game_type,
            status: snapshot.status,
            player1: snapshot.player1,
            player2: snapshot.player2,
            current_turn: snapshot.current_turn,
            winner: snapshot.winner,
            bot_difficulty: snapshot.bot_difficulty,
            state: snapshot.state,
            started_at: snapshot.started_at,
            finished_at: snapshot.finished_at,
            last_move_number,
            settlement: None,
        }
    }

    /// Returns a plain copy of the persisted fields.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            game_type: self.game_type,
            status: self.status,
            player1: self.player1,
            player2: self.player2,
            current_turn: self.current_turn,
            winner: self.winner,
            bot_difficulty: self.bot_difficulty,
            state: self.state.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    /// Returns true if the second slot is played by a bot.
    pub fn vs_bot(&self) -> bool {
        self.bot_difficulty.is_some()
    }

    /// Returns true while moves are accepted.
    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Returns true once the game is over.
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    /// A finished game without a winner.
    pub fn is_draw(&self) -> bool {
        self.is_finished() && self.winner.is_none()
    }

    /// Human-readable name of the game type.
    pub fn game_type_name(&self) -> &'static str {
        self.game_type.display_name()
    }

    /// Returns the slot a human player occupies in this game.
    pub fn player_role(&self, player: PlayerId) -> Option<Side> {
        if self.player1 == player {
            Some(Side::Player1)
        } else if self.player2 == Some(player) {
            Some(Side::Player2)
        } else {
            None
        }
    }

    /// Returns the other human participant, if any.
    pub fn opponent(&self, player: PlayerId) -> Option<PlayerId> {
        match self.player_role(player)? {
            Side::Player1 => self.player2,
            Side::Player2 => Some(self.player1),
        }
    }

    /// Replaces the state blob wholesale.
    pub(crate) fn replace_state(&mut self, state: GameState) {
        self.state = state;
    }

    /// Appends a move to the log, assigning the next move number.
    pub(crate) fn record_move(
        &mut self,
        actor: &Actor,
        move_data: MoveData,
        description: String,
    ) -> NewGameMove {
        self.last_move_number += 1;
        debug!(
            game_id = self.id,
            move_number = self.last_move_number,
            description = %description,
            "Move recorded"
        );
        NewGameMove::new(
            self.id,
            *actor.player_id(),
            self.last_move_number,
            move_data,
            description,
            *actor.is_bot(),
        )
    }

    /// Hands the pending counter update to the persistence layer.
    pub fn take_settlement(&mut self) -> Option<Settlement> {
        self.settlement.take()
    }

    /// Seats `player2` and starts the game.
    ///
    /// No-op (returns false) unless the game is waiting, has no bot and the
    /// joining player is not the owner.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn join(&mut self, player2: PlayerId) -> bool {
        if self.status != GameStatus::Waiting
            || self.player1 == player2
            || self.player2.is_some()
            || self.vs_bot()
        {
            warn!(player2, status = %self.status, "Join refused");
            return false;
        }
        self.player2 = Some(player2);
        self.start()
    }

    /// Starts play: waiting → playing, player1 moves first.
    ///
    /// No-op (returns false) if the game is not waiting or has no opponent.
    /// A bot fills the opponent slot.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn start(&mut self) -> bool {
        if self.status != GameStatus::Waiting || (self.player2.is_none() && !self.vs_bot()) {
            debug!(status = %self.status, "Start preconditions not met");
            return false;
        }
        self.status = GameStatus::Playing;
        self.started_at = Some(Utc::now().naive_utc());
        self.current_turn = Some(self.player1);
        info!(game_type = %self.game_type, "Game started");
        true
    }

    /// Passes the turn to the other side.
    ///
    /// Against a bot the turn always rests on player1; the bot is invoked
    /// on demand rather than through `current_turn`.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn switch_turn(&mut self) {
        let next = if self.vs_bot() {
            Some(self.player1)
        } else if self.current_turn == Some(self.player1) {
            self.player2
        } else {
            Some(self.player1)
        };
        debug!(from = ?self.current_turn, to = ?next, "Switching turn");
        self.current_turn = next;
    }

    /// Points the turn at player1 without alternating.
    pub(crate) fn reset_turn(&mut self) {
        self.current_turn = Some(self.player1);
    }

    /// Ends the game and records the statistics settlement.
    ///
    /// `winner` must be a participant; `None` is a draw (and is also how a
    /// bot win is recorded, since the bot has no counters).
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn finish(&mut self, winner: Option<PlayerId>) {
        if self.status == GameStatus::Finished {
            warn!("Game already finished");
            return;
        }
        let winner = winner.filter(|w| self.player_role(*w).is_some());

        self.status = GameStatus::Finished;
        self.finished_at = Some(Utc::now().naive_utc());
        self.winner = winner;

        let settlement = match winner {
            Some(winner) => Settlement::Win {
                winner,
                loser: self.opponent(winner),
            },
            None => Settlement::Draw {
                players: std::iter::once(self.player1).chain(self.player2).collect(),
            },
        };
        info!(?winner, ?settlement, "Game finished");
        self.settlement = Some(settlement);
    }
}
