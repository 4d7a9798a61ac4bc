use std::fmt;

use crate::links::validate_event_id;

const JOIN: &str = "$add_player";
const LEAVE: &str = "$cancel";

/// Payload of an inline button press, encoded as `<namespace>|<event_id>|<game_id?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    Join { event_id: String, board_game_id: i64 },
    Leave { event_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCallback(pub String);

impl fmt::Display for InvalidCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid callback data: {:?}", self.0)
    }
}

impl std::error::Error for InvalidCallback {}

impl CallbackData {
    pub fn encode(&self) -> String {
        match self {
            Self::Join { event_id, board_game_id } => format!("{JOIN}|{event_id}|{board_game_id}"),
            Self::Leave { event_id } => format!("{LEAVE}|{event_id}"),
        }
    }

    pub fn parse(data: &str) -> Result<Self, InvalidCallback> {
        let invalid = || InvalidCallback(data.to_string());

        // Older buttons carry a form-feed prefix before the namespace.
        let parts: Vec<&str> = data.trim_start_matches('\u{c}').split('|').collect();

        match parts.as_slice() {
            [JOIN, event_id, game_id] if validate_event_id(event_id) => Ok(Self::Join {
                event_id: event_id.to_string(),
                board_game_id: game_id.parse().map_err(|_| invalid())?,
            }),
            [LEAVE, event_id] if validate_event_id(event_id) => Ok(Self::Leave {
                event_id: event_id.to_string(),
            }),
            _ => Err(invalid()),
        }
    }

    pub fn event_id(&self) -> &str {
        match self {
            Self::Join { event_id, .. } | Self::Leave { event_id } => event_id,
        }
    }
}
