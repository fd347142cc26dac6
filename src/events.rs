//! Broadcast hub for game-state snapshots.

use arcade_engine::{GameId, GameSnapshot, NewGameMove};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, instrument};

/// Something observable happened to a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameEvent {
    /// A game was created.
    GameCreated {
        /// Snapshot after creation.
        game: GameSnapshot,
    },
    /// Both slots are filled and play began.
    GameStarted {
        /// Snapshot after the start.
        game: GameSnapshot,
    },
    /// A move was accepted. Private layout edits carry no record.
    MoveMade {
        /// Snapshot after the move.
        game: GameSnapshot,
        /// The move-log entry, if any.
        #[serde(rename = "move")]
        record: Option<NewGameMove>,
    },
    /// The game reached its terminal state.
    GameFinished {
        /// Final snapshot.
        game: GameSnapshot,
    },
}

impl GameEvent {
    /// The snapshot carried by the event.
    pub fn game(&self) -> &GameSnapshot {
        match self {
            GameEvent::GameCreated { game }
            | GameEvent::GameStarted { game }
            | GameEvent::MoveMade { game, .. }
            | GameEvent::GameFinished { game } => game,
        }
    }

    /// Id of the game the event is about.
    pub fn game_id(&self) -> GameId {
        self.game().id
    }

    /// Whether lobby watchers care: a game appeared or left the waiting list.
    pub fn is_lobby(&self) -> bool {
        matches!(self, GameEvent::GameCreated { .. } | GameEvent::GameStarted { .. })
    }

    /// Event name, as used for the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Fan-out of [`GameEvent`]s to every subscriber.
///
/// Slow subscribers lag and skip events; publishing never blocks.
#[derive(Debug, Clone)]
pub struct GameEvents {
    sender: broadcast::Sender<GameEvent>,
}

impl GameEvents {
    /// Creates a hub buffering up to `capacity` events per subscriber.
    #[instrument]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event, returning how many subscribers received it.
    #[instrument(skip(self, event), fields(game_id = event.game_id(), event = event.name()))]
    pub fn publish(&self, event: GameEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(receivers, "Event published");
                receivers
            }
            Err(_) => {
                debug!("No subscribers");
                0
            }
        }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }
}

impl Default for GameEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_engine::{Game, GameType};

    fn snapshot() -> GameSnapshot {
        Game::new(3, GameType::Rpsls, 1, None).snapshot()
    }

    #[test]
    fn event_json_is_tagged() {
        let json = serde_json::to_value(GameEvent::GameCreated { game: snapshot() }).unwrap();
        assert_eq!(json["type"], "game_created");
        assert_eq!(json["game"]["id"], 3);
        assert_eq!(GameEvent::GameFinished { game: snapshot() }.name(), "game_finished");
    }

    #[test]
    fn lobby_sees_creation_and_start_only() {
        assert!(GameEvent::GameCreated { game: snapshot() }.is_lobby());
        assert!(GameEvent::GameStarted { game: snapshot() }.is_lobby());
        assert!(!GameEvent::GameFinished { game: snapshot() }.is_lobby());
        let made = GameEvent::MoveMade {
            game: snapshot(),
            record: None,
        };
        assert!(!made.is_lobby());
    }

    #[test]
    fn subscribers_receive_published_events() {
        let events = GameEvents::new(4);
        assert_eq!(events.publish(GameEvent::GameStarted { game: snapshot() }), 0);

        let mut rx = events.subscribe();
        assert_eq!(events.publish(GameEvent::GameStarted { game: snapshot() }), 1);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.game_id(), 3);
    }
}
