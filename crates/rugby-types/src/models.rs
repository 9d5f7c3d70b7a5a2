use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for highlight listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Upper bound on `limit` for highlight listings.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How many records the featured strip shows.
pub const FEATURED_LIMIT: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_url: String,
    pub duration: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub views: i64,
    pub likes: i64,
    pub posted_date: DateTime<Utc>,
    pub featured: bool,
}

/// Sort keys accepted by the listing endpoint. Anything else falls back to
/// `PostedDate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    PostedDate,
    Views,
    Likes,
    Title,
}

impl SortField {
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "views" => Self::Views,
            "likes" => Self::Likes,
            "title" => Self::Title,
            _ => Self::PostedDate,
        }
    }

    /// Column name used in ORDER BY. Only ever one of these constants.
    pub fn column(self) -> &'static str {
        match self {
            Self::PostedDate => "posted_date",
            Self::Views => "views",
            Self::Likes => "likes",
            Self::Title => "title",
        }
    }
}

/// A validated listing request: at most one category, an optional search
/// term, a sort key and a 1-based page.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: SortField,
    pub page: u32,
    pub limit: u32,
}

impl Default for HighlightFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            sort: SortField::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl HighlightFilter {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// Fields of a highlight about to be inserted. Counters and the posted date
/// are set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHighlight {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_url: String,
    pub duration: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub featured: bool,
}

/// Partial update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl HighlightPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.thumbnail.is_none()
            && self.video_url.is_none()
            && self.duration.is_none()
            && self.categories.is_none()
            && self.tags.is_none()
            && self.featured.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostViewed {
    pub title: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_highlights: i64,
    pub total_views: i64,
    pub most_viewed: Option<MostViewed>,
    pub total_subscribers: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    Reactivated,
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
    HighlightMissing,
}

/// Trim entries, drop empty ones and collapse duplicates
/// (Unicode case-insensitive), keeping the first occurrence.
pub fn normalize_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        let item = item.as_ref().trim();
        let folded = item.to_lowercase();
        if item.is_empty() || seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        out.push(item.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_falls_back_to_posted_date() {
        assert_eq!(SortField::parse_or_default("views"), SortField::Views);
        assert_eq!(SortField::parse_or_default("title"), SortField::Title);
        assert_eq!(SortField::parse_or_default("id; DROP TABLE"), SortField::PostedDate);
        assert_eq!(SortField::parse_or_default(""), SortField::PostedDate);
    }

    #[test]
    fn page_math() {
        let filter = HighlightFilter { page: 3, limit: 12, ..Default::default() };
        assert_eq!(filter.offset(), 24);
        assert_eq!(filter.total_pages(0), 0);
        assert_eq!(filter.total_pages(12), 1);
        assert_eq!(filter.total_pages(13), 2);
    }

    #[test]
    fn normalize_list_trims_and_dedups() {
        let out = normalize_list([" try ", "classic", "", "Try", "  "]);
        assert_eq!(out, vec!["try".to_string(), "classic".to_string()]);

        let accented = normalize_list(["Équipe", "équipe", "ÉQUIPE"]);
        assert_eq!(accented, vec!["Équipe".to_string()]);
    }

    #[test]
    fn statistics_serialize_camel_case() {
        let stats = Statistics {
            total_highlights: 2,
            total_views: 10,
            most_viewed: None,
            total_subscribers: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalHighlights"], 2);
        assert_eq!(json["totalViews"], 10);
        assert!(json["mostViewed"].is_null());
        assert_eq!(json["totalSubscribers"], 1);
    }
}
