use serde::{Deserialize, Serialize};

use crate::models::{BoardGame, Event};

// -- Games --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddGameRequest {
    pub name: String,
    pub max_players: Option<i64>,
    pub catalog_url: Option<String>,
    pub user_id: i64,
    /// When present the requester is also signed up for the new game.
    pub user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGameRequest {
    pub max_players: Option<i64>,
    pub catalog_url: Option<String>,
    pub user_id: i64,
    #[serde(default)]
    pub unlink: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteGameRequest {
    pub user_id: i64,
}

// -- Participants --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinRequest {
    pub game_id: i64,
    pub user_id: i64,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveRequest {
    pub user_id: i64,
}

// -- Index --

/// Query the mini-app is opened with. Telegram forwards `startapp` as `tgWebAppStartParam`.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    #[serde(rename = "tgWebAppStartParam")]
    pub start_param: Option<String>,
    pub startapp: Option<String>,
}

impl IndexQuery {
    pub fn event_id(&self) -> Option<&str> {
        self.start_param
            .as_deref()
            .or(self.startapp.as_deref())
            .filter(|id| !id.is_empty())
    }
}

// -- Responses --

#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    /// Localized "last updated" line.
    pub updated_at: String,
    /// Set when the change was saved but the chat message could not be updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub event_id: String,
    pub event_name: String,
    pub game: BoardGame,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub bot_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
