use anyhow::Result;
use rusqlite::Connection;

use rugby_types::models::{Highlight, SaveOutcome};

use crate::highlights::{attach_labels, query_rows};
use crate::models::{HIGHLIGHT_COLUMNS, UserRow};
use crate::{Database, OptionalExt, now_timestamp};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, now_timestamp()),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Saved highlights --

    /// Add a highlight to the user's saved list. Saving twice keeps one row.
    pub fn save_highlight(&self, user_id: &str, highlight_id: i64) -> Result<SaveOutcome> {
        self.with_conn(|conn| {
            let exists = conn
                .query_row("SELECT 1 FROM highlights WHERE id = ?1", [highlight_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Ok(SaveOutcome::HighlightMissing);
            }

            let inserted = conn.execute(
                "INSERT OR IGNORE INTO user_saved_highlights (user_id, highlight_id, saved_at)
                 VALUES (?1, ?2, ?3)",
                (user_id, highlight_id, now_timestamp()),
            )?;

            Ok(if inserted > 0 {
                SaveOutcome::Saved
            } else {
                SaveOutcome::AlreadySaved
            })
        })
    }

    /// Remove from the saved list. Returns whether a row existed.
    pub fn unsave_highlight(&self, user_id: &str, highlight_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM user_saved_highlights WHERE user_id = ?1 AND highlight_id = ?2",
                (user_id, highlight_id),
            )?;
            Ok(removed > 0)
        })
    }

    /// The user's saved highlights, most recently saved first.
    pub fn saved_highlights(&self, user_id: &str) -> Result<Vec<Highlight>> {
        self.with_conn(|conn| {
            let rows = query_rows(
                conn,
                &format!(
                    "SELECT {HIGHLIGHT_COLUMNS} FROM highlights h
                     JOIN user_saved_highlights s ON s.highlight_id = h.id
                     WHERE s.user_id = ?1
                     ORDER BY s.saved_at DESC, s.rowid DESC"
                ),
                [user_id],
            )?;
            attach_labels(conn, rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}
