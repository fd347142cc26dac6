//! Database models and their conversions to engine types.

use std::str::FromStr;

use arcade_engine::{
    Difficulty, EngineError, Game, GameSnapshot, GameState, GameStatus, GameType, MoveData,
    NewGameMove,
};
use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::db::{DbError, schema};

/// Player profile with win/loss/draw counters.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::players)]
pub struct Player {
    id: i32,
    username: String,
    wins_count: i32,
    losses_count: i32,
    draws_count: i32,
    created_at: NaiveDateTime,
}

impl Player {
    /// Number of finished games the player took part in.
    pub fn total_games(&self) -> i32 {
        self.wins_count + self.losses_count + self.draws_count
    }

    /// Win rate as a percentage rounded to one decimal (0.0–100.0).
    #[instrument(skip(self), fields(player_id = self.id))]
    pub fn win_rate(&self) -> f64 {
        let total = self.total_games();
        if total == 0 {
            0.0
        } else {
            (self.wins_count as f64 / total as f64 * 1000.0).round() / 10.0
        }
    }
}

/// Insertable player.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::players)]
pub struct NewPlayer {
    username: String,
}

/// Raw `games` row. The engine view is built with [`GameRow::into_game`].
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRow {
    id: i32,
    game_type: String,
    status: String,
    player1_id: i32,
    player2_id: Option<i32>,
    current_turn_id: Option<i32>,
    winner_id: Option<i32>,
    bot_difficulty: Option<String>,
    state: String,
    started_at: Option<NaiveDateTime>,
    finished_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

impl GameRow {
    /// Decodes the row into a plain snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] for an unknown game type, status or difficulty,
    /// or a state column that is not valid JSON.
    #[instrument(skip(self), fields(game_id = self.id, game_type = %self.game_type))]
    pub fn into_snapshot(self) -> Result<GameSnapshot, DbError> {
        let game_type = GameType::from_str(&self.game_type)
            .map_err(|_| EngineError::UnknownGameType(self.game_type.clone()))?;
        let status = GameStatus::from_str(&self.status)
            .map_err(|_| DbError::new(format!("Unknown game status: '{}'", self.status)))?;
        let bot_difficulty = self
            .bot_difficulty
            .as_deref()
            .map(|s| {
                Difficulty::from_str(s)
                    .map_err(|_| DbError::new(format!("Unknown bot difficulty: '{}'", s)))
            })
            .transpose()?;
        let state: GameState = serde_json::from_str(&self.state)?;

        Ok(GameSnapshot {
            id: self.id,
            game_type,
            status,
            player1: self.player1_id,
            player2: self.player2_id,
            current_turn: self.current_turn_id,
            winner: self.winner_id,
            bot_difficulty,
            state,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }

    /// Decodes the row into a live [`Game`].
    ///
    /// # Errors
    ///
    /// See [`GameRow::into_snapshot`].
    pub fn into_game(self, last_move_number: i32) -> Result<Game, DbError> {
        Ok(Game::restore(self.into_snapshot()?, last_move_number))
    }
}

/// Insertable game row; the engine fills in the rest on the first update.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGameRow {
    game_type: String,
    player1_id: i32,
    bot_difficulty: Option<String>,
}

/// Every mutable column of a game, written back after each change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::games, treat_none_as_null = true)]
pub struct GameChanges {
    status: String,
    player2_id: Option<i32>,
    current_turn_id: Option<i32>,
    winner_id: Option<i32>,
    state: String,
    started_at: Option<NaiveDateTime>,
    finished_at: Option<NaiveDateTime>,
}

impl TryFrom<&Game> for GameChanges {
    type Error = DbError;

    fn try_from(game: &Game) -> Result<Self, Self::Error> {
        Ok(Self {
            status: game.status().to_string(),
            player2_id: *game.player2(),
            current_turn_id: *game.current_turn(),
            winner_id: *game.winner(),
            state: serde_json::to_string(game.state())?,
            started_at: *game.started_at(),
            finished_at: *game.finished_at(),
        })
    }
}

/// Persisted move-log entry.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_moves)]
pub struct GameMove {
    id: i32,
    game_id: i32,
    player_id: i32,
    move_number: i32,
    move_data: String,
    description: String,
    by_bot: bool,
    created_at: NaiveDateTime,
}

impl GameMove {
    /// Parses the stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the column is not a valid payload.
    pub fn payload(&self) -> Result<MoveData, DbError> {
        Ok(serde_json::from_str(&self.move_data)?)
    }
}

/// Insertable move-log entry.
#[derive(Debug, Clone, Insertable, Getters)]
#[diesel(table_name = schema::game_moves)]
pub struct NewGameMoveRow {
    game_id: i32,
    player_id: i32,
    move_number: i32,
    move_data: String,
    description: String,
    by_bot: bool,
}

impl TryFrom<&NewGameMove> for NewGameMoveRow {
    type Error = DbError;

    fn try_from(record: &NewGameMove) -> Result<Self, Self::Error> {
        Ok(Self {
            game_id: *record.game_id(),
            player_id: *record.player_id(),
            move_number: *record.move_number(),
            move_data: serde_json::to_string(record.move_data())?,
            description: record.description().clone(),
            by_bot: *record.by_bot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(wins: i32, losses: i32, draws: i32) -> Player {
        Player {
            id: 1,
            username: "alice".into(),
            wins_count: wins,
            losses_count: losses,
            draws_count: draws,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn win_rate_rounds_to_one_decimal() {
        assert_eq!(player(1, 2, 0).win_rate(), 33.3);
        assert_eq!(player(2, 1, 0).win_rate(), 66.7);
        assert_eq!(player(0, 0, 0).win_rate(), 0.0);
        assert_eq!(player(3, 1, 1).total_games(), 5);
    }

    fn row(game_type: &str) -> GameRow {
        GameRow {
            id: 7,
            game_type: game_type.into(),
            status: "waiting".into(),
            player1_id: 1,
            player2_id: None,
            current_turn_id: None,
            winner_id: None,
            bot_difficulty: Some("hard".into()),
            state: r#"{"type":"empty"}"#.into(),
            started_at: None,
            finished_at: None,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn row_decodes_into_game() {
        let game = row("rpsls").into_game(3).unwrap();
        assert_eq!(*game.game_type(), GameType::Rpsls);
        assert_eq!(*game.bot_difficulty(), Some(Difficulty::Hard));
        assert_eq!(*game.last_move_number(), 3);
        assert_eq!(*game.state(), GameState::Empty);
    }

    #[test]
    fn unknown_game_type_is_fatal() {
        let err = row("chess").into_snapshot().unwrap_err();
        assert!(err.message.contains("Unknown game type: chess"));
    }
}
