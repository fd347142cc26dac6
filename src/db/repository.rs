//! Database repository for players, games and the move log.

use arcade_engine::{
    Difficulty, Game, GameId, GameSnapshot, GameStatus, GameType, MoveData, MoveOutcome, PlayerId,
    Settlement, initialize_game,
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{
    DbError, GameChanges, GameMove, GameRow, NewGameMoveRow, NewGameRow, NewPlayer, Player, schema,
};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Number of players on the leaderboard.
pub const LEADERBOARD_LIMIT: i64 = 20;

/// Number of finished games listed per player.
pub const FINISHED_GAMES_LIMIT: i64 = 50;

/// Number of past RPSLS choices handed to the bot.
pub const RPSLS_HISTORY_LIMIT: i64 = 10;

/// Milliseconds a connection waits on a locked database.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Database repository for player, game and move operations.
///
/// Every call opens its own connection; writes that belong together run in
/// one immediate transaction.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection with foreign keys enforced.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            BUSY_TIMEOUT_MS
        ))?;
        Ok(conn)
    }

    /// Applies pending schema migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Creates a player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the username is taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_player(&self, username: &str) -> Result<Player, DbError> {
        let mut conn = self.connection()?;
        let player = diesel::insert_into(schema::players::table)
            .values(&NewPlayer::new(username.to_string()))
            .returning(Player::as_returning())
            .get_result(&mut conn)?;

        info!(player_id = player.id(), username = %player.username(), "Player created");
        Ok(player)
    }

    /// Finds a player by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>, DbError> {
        let mut conn = self.connection()?;
        Ok(schema::players::table
            .find(player_id)
            .select(Player::as_select())
            .first(&mut conn)
            .optional()?)
    }

    /// Finds a player by username.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_player_by_username(&self, username: &str) -> Result<Option<Player>, DbError> {
        let mut conn = self.connection()?;
        let player = schema::players::table
            .filter(schema::players::username.eq(username))
            .select(Player::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = player.is_some(), "Player lookup by username");
        Ok(player)
    }

    /// Players with the most wins, ties broken by registration order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn leaderboard(&self) -> Result<Vec<Player>, DbError> {
        let mut conn = self.connection()?;
        let players = schema::players::table
            .order((schema::players::wins_count.desc(), schema::players::id.asc()))
            .limit(LEADERBOARD_LIMIT)
            .select(Player::as_select())
            .load(&mut conn)?;

        debug!(count = players.len(), "Leaderboard loaded");
        Ok(players)
    }

    /// Creates a game with its initial state. Bot games start at once.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the owner does not exist or a database error
    /// occurs.
    #[instrument(skip(self))]
    pub fn create_game(
        &self,
        game_type: GameType,
        player1: PlayerId,
        bot_difficulty: Option<Difficulty>,
    ) -> Result<Game, DbError> {
        let mut conn = self.connection()?;
        let game = conn.immediate_transaction(|conn| {
            let row = diesel::insert_into(schema::games::table)
                .values(&NewGameRow::new(
                    game_type.to_string(),
                    player1,
                    bot_difficulty.map(|d| d.to_string()),
                ))
                .returning(GameRow::as_returning())
                .get_result(conn)?;

            let mut game = row.into_game(0)?;
            initialize_game(&mut game);
            if game.vs_bot() {
                game.start();
            }
            write_game(conn, &game)?;
            Ok::<_, DbError>(game)
        })?;

        info!(game_id = game.id(), status = %game.status(), "Game created");
        Ok(game)
    }

    /// Loads a game together with its last move number.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the row cannot be decoded or a database error
    /// occurs.
    #[instrument(skip(self))]
    pub fn load_game(&self, game_id: GameId) -> Result<Option<Game>, DbError> {
        let mut conn = self.connection()?;
        load_game(&mut conn, game_id)
    }

    /// Seats a second player and starts the game.
    ///
    /// Returns `None` for an unknown game, otherwise the game and whether the
    /// join took effect.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn join_game(
        &self,
        game_id: GameId,
        player2: PlayerId,
    ) -> Result<Option<(Game, bool)>, DbError> {
        let mut conn = self.connection()?;
        conn.immediate_transaction(|conn| {
            let Some(mut game) = load_game(conn, game_id)? else {
                return Ok(None);
            };
            let joined = game.join(player2);
            if joined {
                write_game(conn, &game)?;
                info!(game_id, player2, "Player joined");
            }
            Ok(Some((game, joined)))
        })
    }

    /// Loads a game, applies `apply` to it and persists the result.
    ///
    /// On acceptance the envelope and state, the move row and the counter
    /// settlement are written in the same immediate transaction. A rejected
    /// move writes nothing. Returns `None` for an unknown game.
    ///
    /// # Errors
    ///
    /// Returns whatever `apply` returns, or a storage error converted into `E`.
    #[instrument(skip(self, apply))]
    pub fn commit_move<E, F>(
        &self,
        game_id: GameId,
        apply: F,
    ) -> Result<Option<(Game, MoveOutcome)>, E>
    where
        F: FnOnce(&mut Game) -> Result<MoveOutcome, E>,
        E: From<DbError> + From<diesel::result::Error>,
    {
        let mut conn = self.connection()?;
        conn.immediate_transaction(|conn| {
            let Some(mut game) = load_game(conn, game_id)? else {
                return Ok(None);
            };
            let outcome = apply(&mut game)?;
            if outcome.is_accepted() {
                write_game(conn, &game)?;
                if let Some(record) = outcome.record() {
                    diesel::insert_into(schema::game_moves::table)
                        .values(&NewGameMoveRow::try_from(record)?)
                        .execute(conn)?;
                }
                if let Some(settlement) = game.take_settlement() {
                    apply_settlement(conn, &settlement)?;
                }
            }
            Ok(Some((game, outcome)))
        })
    }

    /// The move log of a game in move order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_moves(&self, game_id: GameId) -> Result<Vec<GameMove>, DbError> {
        let mut conn = self.connection()?;
        let moves = schema::game_moves::table
            .filter(schema::game_moves::game_id.eq(game_id))
            .order(schema::game_moves::move_number.asc())
            .select(GameMove::as_select())
            .load(&mut conn)?;

        debug!(count = moves.len(), "Moves loaded");
        Ok(moves)
    }

    /// A player's own most recent RPSLS payloads from games other than
    /// `current_game`, newest first. Moves the bot made on the player's
    /// behalf are excluded, and so is the hidden choice of the round in play.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_rpsls_choices(
        &self,
        player_id: PlayerId,
        current_game: GameId,
    ) -> Result<Vec<MoveData>, DbError> {
        let mut conn = self.connection()?;
        let rows: Vec<String> = schema::game_moves::table
            .inner_join(schema::games::table)
            .filter(schema::games::game_type.eq(GameType::Rpsls.to_string()))
            .filter(schema::game_moves::player_id.eq(player_id))
            .filter(schema::game_moves::game_id.ne(current_game))
            .filter(schema::game_moves::by_bot.eq(false))
            .order(schema::game_moves::id.desc())
            .limit(RPSLS_HISTORY_LIMIT)
            .select(schema::game_moves::move_data)
            .load(&mut conn)?;

        let history = rows
            .iter()
            .filter_map(|raw| match serde_json::from_str::<MoveData>(raw) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable move payload");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(count = history.len(), "RPSLS history loaded");
        Ok(history)
    }

    /// Games waiting for an opponent, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a row cannot be decoded or a database error
    /// occurs.
    #[instrument(skip(self))]
    pub fn waiting_games(&self) -> Result<Vec<GameSnapshot>, DbError> {
        let mut conn = self.connection()?;
        schema::games::table
            .filter(schema::games::status.eq(GameStatus::Waiting.to_string()))
            .order(schema::games::id.desc())
            .select(GameRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(GameRow::into_snapshot)
            .collect()
    }

    /// A player's finished games, most recently finished first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a row cannot be decoded or a database error
    /// occurs.
    #[instrument(skip(self))]
    pub fn finished_games(&self, player_id: PlayerId) -> Result<Vec<GameSnapshot>, DbError> {
        use schema::games::dsl;

        let mut conn = self.connection()?;
        dsl::games
            .filter(dsl::status.eq(GameStatus::Finished.to_string()))
            .filter(dsl::player1_id.eq(player_id).or(dsl::player2_id.eq(player_id)))
            .order((dsl::finished_at.desc(), dsl::id.desc()))
            .limit(FINISHED_GAMES_LIMIT)
            .select(GameRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(GameRow::into_snapshot)
            .collect()
    }
}

fn load_game(conn: &mut SqliteConnection, game_id: GameId) -> Result<Option<Game>, DbError> {
    let Some(row) = schema::games::table
        .find(game_id)
        .select(GameRow::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let last_move_number = schema::game_moves::table
        .filter(schema::game_moves::game_id.eq(game_id))
        .select(diesel::dsl::max(schema::game_moves::move_number))
        .first::<Option<i32>>(conn)?
        .unwrap_or(0);
    Ok(Some(row.into_game(last_move_number)?))
}

fn write_game(conn: &mut SqliteConnection, game: &Game) -> Result<(), DbError> {
    diesel::update(schema::games::table.find(*game.id()))
        .set(&GameChanges::try_from(game)?)
        .execute(conn)?;
    Ok(())
}

#[instrument(skip(conn))]
fn apply_settlement(conn: &mut SqliteConnection, settlement: &Settlement) -> Result<(), DbError> {
    use schema::players::dsl;

    match settlement {
        Settlement::Win { winner, loser } => {
            diesel::update(dsl::players.find(*winner))
                .set(dsl::wins_count.eq(dsl::wins_count + 1))
                .execute(conn)?;
            if let Some(loser) = loser {
                diesel::update(dsl::players.find(*loser))
                    .set(dsl::losses_count.eq(dsl::losses_count + 1))
                    .execute(conn)?;
            }
        }
        Settlement::Draw { players } => {
            diesel::update(dsl::players.filter(dsl::id.eq_any(players.clone())))
                .set(dsl::draws_count.eq(dsl::draws_count + 1))
                .execute(conn)?;
        }
    }
    debug!("Settlement applied");
    Ok(())
}
