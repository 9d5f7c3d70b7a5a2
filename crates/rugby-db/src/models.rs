//! Row shapes read back from SQLite before they become API models.

use chrono::{DateTime, NaiveDateTime, Utc};
use rugby_types::models::Highlight;
use tracing::warn;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct HighlightRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_url: String,
    pub duration: String,
    pub views: i64,
    pub likes: i64,
    pub posted_date: String,
    pub featured: bool,
}

/// Column list matching [`HighlightRow::from_row`]. Callers alias the table
/// as `h`.
pub(crate) const HIGHLIGHT_COLUMNS: &str = "h.id, h.title, h.description, h.thumbnail, h.video_url, \
     h.duration, h.views, h.likes, h.posted_date, h.featured";

impl HighlightRow {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            thumbnail: row.get(3)?,
            video_url: row.get(4)?,
            duration: row.get(5)?,
            views: row.get(6)?,
            likes: row.get(7)?,
            posted_date: row.get(8)?,
            featured: row.get(9)?,
        })
    }

    pub fn into_highlight(self, categories: Vec<String>, tags: Vec<String>) -> Highlight {
        let posted_date = parse_timestamp(&self.posted_date).unwrap_or_else(|| {
            warn!("Corrupt posted_date '{}' on highlight {}", self.posted_date, self.id);
            DateTime::default()
        });

        Highlight {
            id: self.id,
            title: self.title,
            description: self.description,
            thumbnail: self.thumbnail,
            video_url: self.video_url,
            duration: self.duration,
            categories,
            tags,
            views: self.views,
            likes: self.likes,
            posted_date,
            featured: self.featured,
        }
    }
}

/// Accepts RFC 3339 and SQLite's `datetime('now')` format (no timezone,
/// taken as UTC) for rows inserted by hand.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_in_both_formats() {
        let a = parse_timestamp("2024-03-16T14:45:00.250Z").unwrap();
        let b = parse_timestamp("2024-03-16 14:45:00").unwrap();
        assert_eq!(a.timestamp(), b.timestamp());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
