use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE highlights (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                thumbnail    TEXT NOT NULL,
                video_url    TEXT NOT NULL,
                duration     TEXT NOT NULL,
                views        INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
                likes        INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
                posted_date  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                featured     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_highlights_posted ON highlights(posted_date);
            CREATE INDEX idx_highlights_featured ON highlights(featured, posted_date);

            CREATE TABLE highlight_categories (
                highlight_id  INTEGER NOT NULL REFERENCES highlights(id) ON DELETE CASCADE,
                category      TEXT NOT NULL COLLATE NOCASE,
                position      INTEGER NOT NULL,
                PRIMARY KEY (highlight_id, category)
            );

            CREATE INDEX idx_highlight_categories_category ON highlight_categories(category);

            CREATE TABLE highlight_tags (
                highlight_id  INTEGER NOT NULL REFERENCES highlights(id) ON DELETE CASCADE,
                tag           TEXT NOT NULL COLLATE NOCASE,
                position      INTEGER NOT NULL,
                PRIMARY KEY (highlight_id, tag)
            );

            CREATE TABLE user_saved_highlights (
                user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                highlight_id  INTEGER NOT NULL REFERENCES highlights(id) ON DELETE CASCADE,
                saved_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (user_id, highlight_id)
            );

            CREATE INDEX idx_saved_highlight ON user_saved_highlights(highlight_id);

            CREATE TABLE newsletter_subscriptions (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
                active         INTEGER NOT NULL DEFAULT 1,
                subscribed_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
