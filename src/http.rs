//! HTTP surface.
//!
//! Identity is a plain `player_id` in the request body. Storage work runs on
//! the blocking pool; the service itself is synchronous.

use std::convert::Infallible;

use arcade_engine::{Difficulty, GameId, GameSnapshot, GameType, MoveData, MoveResult, PlayerId};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use derive_more::{Display, From};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tower::ServiceBuilder;
use tracing::{error, info, instrument, warn};

use crate::db::Player;
use crate::error::ArcadeError;
use crate::events::GameEvent;
use crate::service::{ArcadeService, MoveView};

/// Builds the router over a shared service.
pub fn router(service: ArcadeService) -> Router {
    Router::new()
        .route("/players", post(create_player))
        .route("/players/{id}", get(get_player))
        .route("/players/{id}/games", get(player_games))
        .route("/leaderboard", get(leaderboard))
        .route("/games", post(create_game))
        .route("/games/waiting", get(waiting_games))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/moves", post(submit_move).get(list_moves))
        .route("/games/{id}/events", get(game_events))
        .route("/lobby/events", get(lobby_events))
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(service)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

/// Failure of an HTTP handler.
#[derive(Debug, Display, From)]
pub enum ApiError {
    /// Service failure.
    #[display("{}", _0)]
    Arcade(ArcadeError),
    /// The blocking task panicked or was cancelled.
    #[display("Task failed: {}", _0)]
    Task(tokio::task::JoinError),
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Arcade(ArcadeError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Arcade(ArcadeError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Arcade(ArcadeError::Db(_) | ArcadeError::Engine(_)) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Runs a service call on the blocking pool.
async fn blocking<T, F>(service: &ArcadeService, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ArcadeService) -> Result<T, ArcadeError> + Send + 'static,
{
    let service = service.clone();
    Ok(tokio::task::spawn_blocking(move || call(&service)).await??)
}

/// Body of `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlayerRequest {
    /// Requested username.
    pub username: String,
}

/// Player profile with derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Player id.
    pub id: PlayerId,
    /// Username.
    pub username: String,
    /// Games won.
    pub wins_count: i32,
    /// Games lost.
    pub losses_count: i32,
    /// Games drawn.
    pub draws_count: i32,
    /// Finished games.
    pub total_games: i32,
    /// Win percentage, one decimal.
    pub win_rate: f64,
}

impl From<&Player> for PlayerStats {
    fn from(player: &Player) -> Self {
        Self {
            id: *player.id(),
            username: player.username().clone(),
            wins_count: *player.wins_count(),
            losses_count: *player.losses_count(),
            draws_count: *player.draws_count(),
            total_games: player.total_games(),
            win_rate: player.win_rate(),
        }
    }
}

/// Body of `POST /games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameRequest {
    /// Owner.
    pub player_id: PlayerId,
    /// Which game.
    pub game_type: GameType,
    /// Set to play against the bot.
    #[serde(default)]
    pub bot_difficulty: Option<Difficulty>,
}

/// Body of `POST /games/{id}/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameRequest {
    /// Joining player.
    pub player_id: PlayerId,
}

/// Body of `POST /games/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMoveRequest {
    /// Acting player.
    pub player_id: PlayerId,
    /// Move payload.
    pub move_data: MoveData,
}

#[instrument(skip(service))]
async fn create_player(
    State(service): State<ArcadeService>,
    Json(body): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerStats>), ApiError> {
    let player = blocking(&service, move |s| s.register_player(&body.username)).await?;
    Ok((StatusCode::CREATED, Json(PlayerStats::from(&player))))
}

async fn get_player(
    State(service): State<ArcadeService>,
    Path(id): Path<PlayerId>,
) -> Result<Json<PlayerStats>, ApiError> {
    let player = blocking(&service, move |s| s.player(id)).await?;
    Ok(Json(PlayerStats::from(&player)))
}

async fn player_games(
    State(service): State<ArcadeService>,
    Path(id): Path<PlayerId>,
) -> Result<Json<Vec<GameSnapshot>>, ApiError> {
    Ok(Json(blocking(&service, move |s| s.finished_games(id)).await?))
}

async fn leaderboard(
    State(service): State<ArcadeService>,
) -> Result<Json<Vec<PlayerStats>>, ApiError> {
    let players = blocking(&service, |s| s.leaderboard()).await?;
    Ok(Json(players.iter().map(PlayerStats::from).collect()))
}

#[instrument(skip(service))]
async fn create_game(
    State(service): State<ArcadeService>,
    Json(body): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameSnapshot>), ApiError> {
    let game = blocking(&service, move |s| {
        s.create_game(body.player_id, body.game_type, body.bot_difficulty)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn waiting_games(
    State(service): State<ArcadeService>,
) -> Result<Json<Vec<GameSnapshot>>, ApiError> {
    Ok(Json(blocking(&service, |s| s.waiting_games()).await?))
}

async fn get_game(
    State(service): State<ArcadeService>,
    Path(id): Path<GameId>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(blocking(&service, move |s| s.game(id)).await?))
}

#[instrument(skip(service))]
async fn join_game(
    State(service): State<ArcadeService>,
    Path(id): Path<GameId>,
    Json(body): Json<JoinGameRequest>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(blocking(&service, move |s| s.join_game(id, body.player_id)).await?))
}

#[instrument(skip(service, body))]
async fn submit_move(
    State(service): State<ArcadeService>,
    Path(id): Path<GameId>,
    Json(body): Json<SubmitMoveRequest>,
) -> Result<(StatusCode, Json<MoveResult>), ApiError> {
    let result = blocking(&service, move |s| {
        s.submit_move(id, body.player_id, body.move_data)
    })
    .await?;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(result)))
}

async fn list_moves(
    State(service): State<ArcadeService>,
    Path(id): Path<GameId>,
) -> Result<Json<Vec<MoveView>>, ApiError> {
    Ok(Json(blocking(&service, move |s| s.moves(id)).await?))
}

/// Streams the game's current snapshot, then every later event for it.
#[instrument(skip(service))]
async fn game_events(
    State(service): State<ArcadeService>,
    Path(id): Path<GameId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let receiver = service.events().subscribe();
    let current = blocking(&service, move |s| s.game(id)).await?;

    let initial = Event::default()
        .event("snapshot")
        .json_data(&current)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
    let updates = BroadcastStream::new(receiver).filter_map(move |received| match received {
        Ok(event) if event.game_id() == id => to_sse(&event).map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(count)) => {
            warn!(game_id = id, lagged_count = count, "Event subscriber lagged");
            None
        }
    });

    let stream = tokio_stream::once(Ok(initial)).chain(updates);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// `GET /lobby/events`: the waiting list, then every game creation and start.
#[instrument(skip(service))]
async fn lobby_events(
    State(service): State<ArcadeService>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let receiver = service.events().subscribe();
    let waiting = blocking(&service, |s| s.waiting_games()).await?;

    let initial = Event::default()
        .event("waiting")
        .json_data(&waiting)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
    let updates = BroadcastStream::new(receiver).filter_map(|received| match received {
        Ok(event) if event.is_lobby() => to_sse(&event).map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(count)) => {
            warn!(lagged_count = count, "Lobby subscriber lagged");
            None
        }
    });

    let stream = tokio_stream::once(Ok(initial)).chain(updates);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &GameEvent) -> Option<Event> {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            warn!(error = %e, "Failed to encode event");
            None
        }
    }
}
