//! Move payloads, move-log records and move outcomes.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Deserializer, Serialize};

use crate::game::{GameId, PlayerId};

/// Flat key/value move payload.
///
/// Which keys matter depends on the game type: `position` for tic-tac-toe,
/// `choice` for RPSLS, `action` plus `ship_type`/`row`/`col`/`horizontal`
/// for battleship. Numbers and booleans are also accepted in string form,
/// since HTML forms submit everything as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    /// Tic-tac-toe cell index, 0-8.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    /// RPSLS choice token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    /// Battleship action tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Battleship ship type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_type: Option<String>,
    /// Battleship row, 0-9.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub row: Option<i64>,
    /// Battleship column, 0-9.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub col: Option<i64>,
    /// Battleship ship orientation.
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<bool>,
}

impl MoveData {
    /// Tic-tac-toe payload.
    pub fn position(position: i64) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// RPSLS payload.
    pub fn choice(choice: impl Into<String>) -> Self {
        Self {
            choice: Some(choice.into()),
            ..Self::default()
        }
    }

    /// Battleship payload carrying only an action tag.
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    /// Battleship `shoot` payload.
    pub fn shoot(row: i64, col: i64) -> Self {
        Self {
            row: Some(row),
            col: Some(col),
            ..Self::action("shoot")
        }
    }

    /// Battleship `place_ship` payload.
    pub fn place_ship(ship_type: impl Into<String>, row: i64, col: i64, horizontal: bool) -> Self {
        Self {
            ship_type: Some(ship_type.into()),
            row: Some(row),
            col: Some(col),
            horizontal: Some(horizontal),
            ..Self::action("place_ship")
        }
    }

    /// Battleship payload naming one ship (`rotate_ship`, `remove_ship`).
    pub fn ship_action(action: impl Into<String>, ship_type: impl Into<String>) -> Self {
        Self {
            ship_type: Some(ship_type.into()),
            ..Self::action(action)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrText {
    Bool(bool),
    Text(String),
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IntOrText>::deserialize(deserializer)? {
        Some(IntOrText::Int(value)) => Some(value),
        Some(IntOrText::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<BoolOrText>::deserialize(deserializer)? {
        Some(BoolOrText::Bool(value)) => Some(value),
        Some(BoolOrText::Text(text)) => match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        None => None,
    })
}

/// A move-log entry produced by an accepted move, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct NewGameMove {
    game_id: GameId,
    /// Acting slot owner; for a bot turn this is the human proxy.
    player_id: PlayerId,
    move_number: i32,
    move_data: MoveData,
    description: String,
    /// Set when the bot made the move through the proxy.
    by_bot: bool,
}

impl NewGameMove {
    /// Replaces the description once a derived event (a sunk ship) is known.
    pub fn upgrade_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}

/// Result of one call into a game service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was applied.
    Accepted {
        /// The log entry, absent for private layout edits.
        record: Option<NewGameMove>,
        /// True when the mover's turn is over (no extra shot).
        turn_passed: bool,
    },
    /// The move was refused and nothing changed.
    Rejected {
        /// Player-facing reason.
        error: String,
    },
}

impl MoveOutcome {
    /// Returns true for [`MoveOutcome::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted { .. })
    }

    /// Returns the log entry of an accepted move.
    pub fn record(&self) -> Option<&NewGameMove> {
        match self {
            MoveOutcome::Accepted { record, .. } => record.as_ref(),
            MoveOutcome::Rejected { .. } => None,
        }
    }

    /// Returns the rejection message.
    pub fn error(&self) -> Option<&str> {
        match self {
            MoveOutcome::Accepted { .. } => None,
            MoveOutcome::Rejected { error } => Some(error),
        }
    }
}

/// Serializable shape of a move attempt handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Whether the move was applied.
    pub success: bool,
    /// The log entry of an accepted move.
    #[serde(rename = "move")]
    pub record: Option<NewGameMove>,
    /// Rejection message.
    pub error: Option<String>,
}

impl From<MoveOutcome> for MoveResult {
    fn from(outcome: MoveOutcome) -> Self {
        match outcome {
            MoveOutcome::Accepted { record, .. } => Self {
                success: true,
                record,
                error: None,
            },
            MoveOutcome::Rejected { error } => Self {
                success: false,
                record: None,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_style_payload_is_accepted() {
        let raw = r#"{"action":"place_ship","ship_type":"cruiser1",
            "row":"3","col":4,"horizontal":"true"}"#;
        let data: MoveData = serde_json::from_str(raw).unwrap();
        assert_eq!(data, MoveData::place_ship("cruiser1", 3, 4, true));
    }

    #[test]
    fn absent_keys_are_omitted() {
        let json = serde_json::to_string(&MoveData::position(4)).unwrap();
        assert_eq!(json, r#"{"position":4}"#);
    }

    #[test]
    fn garbage_number_becomes_none() {
        let data: MoveData = serde_json::from_str(r#"{"position":"abc"}"#).unwrap();
        assert_eq!(data.position, None);
    }

    #[test]
    fn rejected_result_shape() {
        let result = MoveResult::from(MoveOutcome::Rejected {
            error: "Not your turn".into(),
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["move"], serde_json::Value::Null);
        assert_eq!(json["error"], "Not your turn");
    }
}
