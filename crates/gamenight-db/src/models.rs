/// Database row types. One `JoinedRow` is one row of the
/// events ⟕ boardgames ⟕ participants read, with the outer-join sides optional.
use gamenight_types::models::CatalogLink;

#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub event: EventColumns,
    pub game: Option<GameColumns>,
    pub participant: Option<ParticipantColumns>,
}

#[derive(Debug, Clone)]
pub struct EventColumns {
    pub id: String,
    pub chat_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub name: String,
    pub message_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct GameColumns {
    pub id: i64,
    pub name: String,
    pub max_players: i64,
    pub message_id: Option<i64>,
    pub catalog: Option<CatalogLink>,
}

#[derive(Debug, Clone)]
pub struct ParticipantColumns {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
}

/// Values written for a new game.
#[derive(Debug, Clone)]
pub struct NewBoardGame {
    pub name: String,
    pub max_players: i64,
    pub catalog: Option<CatalogLink>,
}

/// Locates a game from the chat message that announced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRef {
    pub event_id: String,
    pub board_game_id: i64,
}
