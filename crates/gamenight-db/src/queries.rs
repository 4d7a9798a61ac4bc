use crate::Database;
use crate::models::{GameRef, NewBoardGame};
use anyhow::Result;
use gamenight_types::links::decode_image_url;
use gamenight_types::models::CatalogLink;
use rusqlite::params;
use uuid::Uuid;

pub const DEFAULT_LANGUAGE: &str = "en";

impl Database {
    // -- Events --

    /// Inserts a new event and returns its generated id.
    pub fn insert_event(&self, chat_id: i64, user_id: i64, user_name: &str, name: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, chat_id, user_id, user_name, name) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, chat_id, user_id, user_name, name],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn set_event_message_id(&self, event_id: &str, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE events SET message_id = ?1 WHERE id = ?2",
                params![message_id, event_id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Board games --

    pub fn insert_board_game(&self, event_id: &str, game: &NewBoardGame) -> Result<i64> {
        let catalog = CatalogColumns::from(game.catalog.as_ref());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO boardgames
                    (event_id, name, max_players, catalog_id, catalog_name, catalog_url, catalog_image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event_id,
                    game.name,
                    game.max_players,
                    catalog.id,
                    catalog.name,
                    catalog.url,
                    catalog.image_url,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn set_board_game_message_id(&self, board_game_id: i64, message_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE boardgames SET message_id = ?1 WHERE id = ?2",
                params![message_id, board_game_id],
            )?;
            Ok(n > 0)
        })
    }

    /// Overwrites capacity and the whole catalog linkage. `None` clears all four catalog columns.
    /// Returns false when the game does not exist.
    pub fn update_board_game(
        &self,
        board_game_id: i64,
        max_players: i64,
        catalog: Option<&CatalogLink>,
    ) -> Result<bool> {
        let catalog = CatalogColumns::from(catalog);
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE boardgames
                 SET max_players = ?1,
                     catalog_id = ?2,
                     catalog_name = ?3,
                     catalog_url = ?4,
                     catalog_image_url = ?5
                 WHERE id = ?6",
                params![
                    max_players,
                    catalog.id,
                    catalog.name,
                    catalog.url,
                    catalog.image_url,
                    board_game_id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_board_game(&self, board_game_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM boardgames WHERE id = ?1", [board_game_id])?;
            Ok(n > 0)
        })
    }

    /// Finds the game announced by `message_id` in `chat_id`.
    pub fn find_game_by_message(&self, chat_id: i64, message_id: i64) -> Result<Option<GameRef>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT b.event_id, b.id
                 FROM boardgames b
                 JOIN events e ON e.id = b.event_id
                 WHERE e.chat_id = ?1 AND b.message_id = ?2",
                params![chat_id, message_id],
                |row| {
                    Ok(GameRef {
                        event_id: row.get(0)?,
                        board_game_id: row.get(1)?,
                    })
                },
            )
            .optional()
        })
    }

    // -- Participants --

    /// Signs a user up for a game. An existing seat of the same user in the
    /// same event is replaced by the unique constraint, not checked here.
    pub fn insert_participant(
        &self,
        event_id: &str,
        board_game_id: i64,
        user_id: i64,
        user_name: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO participants (event_id, boardgame_id, user_id, user_name) VALUES (?1, ?2, ?3, ?4)",
                params![event_id, board_game_id, user_id, user_name],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Delete-if-exists; returns whether a seat was removed.
    pub fn remove_participant(&self, event_id: &str, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM participants WHERE event_id = ?1 AND user_id = ?2",
                params![event_id, user_id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Chats --

    pub fn set_chat_language(&self, chat_id: i64, language: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (chat_id, language) VALUES (?1, ?2)
                 ON CONFLICT(chat_id) DO UPDATE SET language = excluded.language",
                params![chat_id, language],
            )?;
            Ok(())
        })
    }

    pub fn chat_language(&self, chat_id: i64) -> Result<String> {
        self.with_conn(|conn| {
            let language = conn
                .query_row("SELECT language FROM chats WHERE chat_id = ?1", [chat_id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
        })
    }
}

/// The four nullable catalog columns, written together.
struct CatalogColumns {
    id: Option<i64>,
    name: Option<String>,
    url: Option<String>,
    image_url: Option<String>,
}

impl From<Option<&CatalogLink>> for CatalogColumns {
    fn from(link: Option<&CatalogLink>) -> Self {
        match link {
            Some(link) => Self {
                id: Some(link.id),
                name: Some(link.name.clone()),
                url: Some(link.url.clone()),
                image_url: Some(decode_image_url(&link.image_url)),
            },
            None => Self {
                id: None,
                name: None,
                url: None,
                image_url: None,
            },
        }
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventSelector;

    fn seeded() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let event_id = db.insert_event(1, 42, "alice", "Friday Night").unwrap();
        (db, event_id)
    }

    fn game(name: &str) -> NewBoardGame {
        NewBoardGame {
            name: name.into(),
            max_players: 5,
            catalog: None,
        }
    }

    fn load(db: &Database, event_id: &str) -> gamenight_types::models::Event {
        db.load_event(&EventSelector::ById(event_id.into())).unwrap().unwrap()
    }

    fn seat_count(db: &Database, event_id: &str, user_id: i64) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM participants WHERE event_id = ?1 AND user_id = ?2",
                params![event_id, user_id],
                |row| row.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn games_load_sorted_by_name() {
        let (db, event_id) = seeded();
        db.insert_board_game(&event_id, &game("Zoo")).unwrap();
        db.insert_board_game(&event_id, &game("Ants")).unwrap();

        let names: Vec<String> = load(&db, &event_id).board_games.into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Ants", "Zoo"]);
    }

    #[test]
    fn equal_game_names_sort_by_id() {
        let (db, event_id) = seeded();
        let first = db.insert_board_game(&event_id, &game("Catan")).unwrap();
        let second = db.insert_board_game(&event_id, &game("Catan")).unwrap();
        let ids: Vec<i64> = load(&db, &event_id).board_games.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn rejoining_moves_the_single_seat() {
        let (db, event_id) = seeded();
        let a = db.insert_board_game(&event_id, &game("Azul")).unwrap();
        let b = db.insert_board_game(&event_id, &game("Brass")).unwrap();

        for target in [a, b, a, b] {
            db.insert_participant(&event_id, target, 7, "bob").unwrap();
        }

        assert_eq!(seat_count(&db, &event_id, 7), 1);
        let event = load(&db, &event_id);
        assert_eq!(event.game_of(7).map(|g| g.id), Some(b));
        assert!(event.board_game(a).unwrap().participants.is_empty());
    }

    #[test]
    fn leave_without_seat_is_noop() {
        let (db, event_id) = seeded();
        db.insert_board_game(&event_id, &game("Catan")).unwrap();
        let before = load(&db, &event_id);

        assert!(!db.remove_participant(&event_id, 99).unwrap());
        assert_eq!(load(&db, &event_id), before);
    }

    #[test]
    fn latest_event_in_chat_wins() {
        let (db, first) = seeded();
        let second = db.insert_event(1, 42, "alice", "Saturday").unwrap();
        db.insert_event(2, 42, "alice", "Elsewhere").unwrap();

        let latest = db.load_event(&EventSelector::LatestInChat(1)).unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_ne!(latest.id, first);
        assert!(db.load_event(&EventSelector::LatestInChat(3)).unwrap().is_none());
        assert!(db.load_event(&EventSelector::ById("missing".into())).unwrap().is_none());
    }

    #[test]
    fn catalog_columns_are_all_or_nothing() {
        let (db, event_id) = seeded();
        let link = CatalogLink {
            id: 13,
            name: "CATAN".into(),
            url: "https://boardgamegeek.com/boardgame/13".into(),
            image_url: "https://cf.example/filters:format%28png%29/x.png".into(),
        };
        let id = db
            .insert_board_game(&event_id, &NewBoardGame { catalog: Some(link.clone()), ..game("Catan") })
            .unwrap();

        let loaded = load(&db, &event_id).board_game(id).unwrap().catalog.clone().unwrap();
        assert_eq!(loaded.image_url, "https://cf.example/filters:format(png)/x.png");

        assert!(db.update_board_game(id, 4, None).unwrap());
        let game = load(&db, &event_id).board_game(id).unwrap().clone();
        assert_eq!(game.max_players, 4);
        assert!(game.catalog.is_none());

        assert!(!db.update_board_game(999, 4, None).unwrap());
    }

    #[test]
    fn game_message_lookup_is_scoped_to_chat() {
        let (db, event_id) = seeded();
        let id = db.insert_board_game(&event_id, &game("Catan")).unwrap();
        db.set_board_game_message_id(id, 555).unwrap();

        assert_eq!(
            db.find_game_by_message(1, 555).unwrap(),
            Some(GameRef { event_id: event_id.clone(), board_game_id: id })
        );
        assert_eq!(db.find_game_by_message(2, 555).unwrap(), None);
    }

    #[test]
    fn deleting_event_cascades() {
        let (db, event_id) = seeded();
        let id = db.insert_board_game(&event_id, &game("Catan")).unwrap();
        db.insert_participant(&event_id, id, 7, "bob").unwrap();

        db.with_conn(|conn| {
            conn.execute("DELETE FROM events WHERE id = ?1", [&event_id])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(seat_count(&db, &event_id, 7), 0);
        assert!(!db.delete_board_game(id).unwrap());
    }

    #[test]
    fn chat_language_defaults_and_overwrites() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.chat_language(1).unwrap(), "en");
        db.set_chat_language(1, "it").unwrap();
        db.set_chat_language(1, "en").unwrap();
        db.set_chat_language(1, "it").unwrap();
        assert_eq!(db.chat_language(1).unwrap(), "it");

        let rows: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM chats", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn message_id_is_written_back() {
        let (db, event_id) = seeded();
        assert_eq!(load(&db, &event_id).message_id, None);
        assert!(db.set_event_message_id(&event_id, 100).unwrap());
        assert_eq!(load(&db, &event_id).message_id, Some(100));
    }
}
