use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::warn;

use gamenight_types::models::{BoardGame, CatalogLink, Event, Participant};

use crate::Database;
use crate::models::{EventColumns, GameColumns, JoinedRow, ParticipantColumns};

/// Which event an aggregate read targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSelector {
    /// Most recently created event of a chat.
    LatestInChat(i64),
    ById(String),
}

const SELECT_AGGREGATE: &str = "
    SELECT e.id, e.chat_id, e.user_id, e.user_name, e.name, e.message_id, e.created_at,
           b.id, b.name, b.max_players, b.message_id,
           b.catalog_id, b.catalog_name, b.catalog_url, b.catalog_image_url,
           p.id, p.user_id, p.user_name
    FROM events e
    LEFT JOIN boardgames b ON b.event_id = e.id
    LEFT JOIN participants p ON p.boardgame_id = b.id";

impl Database {
    /// Loads the full Event → BoardGames → Participants aggregate in one read.
    pub fn load_event(&self, selector: &EventSelector) -> Result<Option<Event>> {
        self.with_conn(|conn| query_event(conn, selector))
    }
}

fn query_event(conn: &Connection, selector: &EventSelector) -> Result<Option<Event>> {
    let (filter, param): (&str, rusqlite::types::Value) = match selector {
        EventSelector::LatestInChat(chat_id) => (
            "WHERE e.id = (SELECT id FROM events WHERE chat_id = ?1
                           ORDER BY created_at DESC, rowid DESC LIMIT 1)",
            (*chat_id).into(),
        ),
        EventSelector::ById(id) => ("WHERE e.id = ?1", id.clone().into()),
    };

    // Rows come grouped by game and in participant insertion order.
    let sql = format!("{SELECT_AGGREGATE} {filter} ORDER BY b.id, p.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([param], decode_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(fold_event(rows))
}

fn decode_row(row: &Row<'_>) -> rusqlite::Result<JoinedRow> {
    let event = EventColumns {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        name: row.get(4)?,
        message_id: row.get(5)?,
        created_at: row.get(6)?,
    };

    let game = match row.get::<_, Option<i64>>(7)? {
        Some(id) => {
            let catalog = match (
                row.get::<_, Option<i64>>(11)?,
                row.get::<_, Option<String>>(12)?,
                row.get::<_, Option<String>>(13)?,
                row.get::<_, Option<String>>(14)?,
            ) {
                (Some(catalog_id), Some(name), Some(url), Some(image_url)) => Some(CatalogLink {
                    id: catalog_id,
                    name,
                    url,
                    image_url,
                }),
                _ => None,
            };

            Some(GameColumns {
                id,
                name: row.get(8)?,
                max_players: row.get(9)?,
                message_id: row.get(10)?,
                catalog,
            })
        }
        None => None,
    };

    let participant = match row.get::<_, Option<i64>>(15)? {
        Some(id) => Some(ParticipantColumns {
            id,
            user_id: row.get(16)?,
            user_name: row.get(17)?,
        }),
        None => None,
    };

    Ok(JoinedRow {
        event,
        game,
        participant,
    })
}

/// Folds the outer-join fan-out into one aggregate.
///
/// Games are deduplicated by id (first occurrence wins), participants are
/// attached to the game on their row, then both levels get canonical order:
/// participants by display name, games by name then id. Returns `None` for
/// an empty row set.
pub fn fold_event(rows: impl IntoIterator<Item = JoinedRow>) -> Option<Event> {
    let mut rows = rows.into_iter().peekable();
    let head = rows.peek()?.event.clone();

    let mut event = Event::new(
        head.id,
        head.chat_id,
        head.user_id,
        head.user_name,
        head.name,
        head.message_id,
        parse_timestamp(&head.created_at),
    );

    let mut arena: BTreeMap<i64, BoardGame> = BTreeMap::new();
    for row in rows {
        let Some(game) = row.game else { continue };
        let entry = arena.entry(game.id).or_insert_with(|| BoardGame {
            id: game.id,
            name: game.name,
            max_players: game.max_players,
            message_id: game.message_id,
            catalog: game.catalog,
            participants: Vec::new(),
        });

        if let Some(p) = row.participant {
            entry.participants.push(Participant {
                id: p.id,
                user_id: p.user_id,
                display_name: p.user_name,
            });
        }
    }

    // The arena iterates by id, so the stable name sort breaks ties by id.
    let mut games: Vec<BoardGame> = arena.into_values().collect();
    for game in &mut games {
        game.participants.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    }
    games.sort_by(|a, b| a.name.cmp(&b.name));

    event.board_games = games;
    Some(event)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; it is UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            DateTime::default()
        })
}
