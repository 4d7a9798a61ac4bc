use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lock;

/// One organized gathering, loaded together with its games and participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub chat_id: i64,
    pub creator_user_id: i64,
    pub creator_name: String,
    pub name: String,
    /// Chat message currently showing this event. `None` until the first render succeeds.
    pub message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// Derived from `name` at load time, never stored.
    pub locked: bool,
    pub board_games: Vec<BoardGame>,
}

impl Event {
    /// Builds an event with an empty game list; `locked` is derived from `name`.
    pub fn new(
        id: String,
        chat_id: i64,
        creator_user_id: i64,
        creator_name: String,
        name: String,
        message_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let locked = lock::is_locked(&name);
        Self {
            id,
            chat_id,
            creator_user_id,
            creator_name,
            name,
            message_id,
            created_at,
            locked,
            board_games: Vec::new(),
        }
    }

    /// Whether `user_id` may add or change games on this event.
    pub fn may_edit(&self, user_id: i64) -> bool {
        !self.locked || self.creator_user_id == user_id
    }

    pub fn board_game(&self, board_game_id: i64) -> Option<&BoardGame> {
        self.board_games.iter().find(|g| g.id == board_game_id)
    }

    /// The game `user_id` is currently signed up for, if any.
    pub fn game_of(&self, user_id: i64) -> Option<&BoardGame> {
        self.board_games
            .iter()
            .find(|g| g.participants.iter().any(|p| p.user_id == user_id))
    }

    /// Direct chats with the bot have positive ids; groups are negative.
    pub fn is_direct_chat(&self) -> bool {
        self.chat_id > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardGame {
    pub id: i64,
    pub name: String,
    pub max_players: i64,
    /// Chat reply announcing this game; replies to it update the game.
    pub message_id: Option<i64>,
    pub catalog: Option<CatalogLink>,
    pub participants: Vec<Participant>,
}

impl BoardGame {
    pub fn is_full(&self) -> bool {
        self.participants.len() as i64 == self.max_players
    }
}

/// Catalog metadata attached to a game. Stored as four columns that are
/// either all set or all null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLink {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Empty when the catalog has no image for the item.
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> Event {
        Event::new("e".into(), 1, 42, "alice".into(), name.into(), None, Utc::now())
    }

    #[test]
    fn locked_follows_name() {
        assert!(!event("Friday Night").locked);
        assert!(event("Friday Night 🔒").locked);
    }

    #[test]
    fn only_creator_may_edit_locked_event() {
        let open = event("Friday Night");
        assert!(open.may_edit(7));

        let locked = event("🔒 Friday Night");
        assert!(locked.may_edit(42));
        assert!(!locked.may_edit(7));
    }

    #[test]
    fn game_is_full_at_capacity() {
        let mut game = BoardGame {
            id: 1,
            name: "Catan".into(),
            max_players: 2,
            message_id: None,
            catalog: None,
            participants: vec![],
        };
        assert!(!game.is_full());
        for user_id in [1, 2] {
            game.participants.push(Participant {
                id: user_id,
                user_id,
                display_name: format!("user_{user_id}"),
            });
        }
        assert!(game.is_full());
    }
}
