use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS chats (
            chat_id     INTEGER PRIMARY KEY,
            language    TEXT NOT NULL DEFAULT 'en'
        );

        CREATE TABLE IF NOT EXISTS events (
            id          TEXT PRIMARY KEY,
            chat_id     INTEGER NOT NULL,
            user_id     INTEGER NOT NULL,
            user_name   TEXT NOT NULL,
            name        TEXT NOT NULL,
            message_id  INTEGER,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_events_chat
            ON events(chat_id, created_at);

        CREATE TABLE IF NOT EXISTS boardgames (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id            TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            name                TEXT NOT NULL,
            max_players         INTEGER NOT NULL,
            message_id          INTEGER,
            catalog_id          INTEGER,
            catalog_name        TEXT,
            catalog_url         TEXT,
            catalog_image_url   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_boardgames_event
            ON boardgames(event_id);

        -- One seat per user per event: a second join replaces the first.
        CREATE TABLE IF NOT EXISTS participants (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id        TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            boardgame_id    INTEGER NOT NULL REFERENCES boardgames(id) ON DELETE CASCADE,
            user_id         INTEGER NOT NULL,
            user_name       TEXT NOT NULL,
            UNIQUE(event_id, user_id) ON CONFLICT REPLACE
        );

        CREATE INDEX IF NOT EXISTS idx_participants_boardgame
            ON participants(boardgame_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
