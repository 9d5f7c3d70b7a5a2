use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    DEFAULT_PAGE_SIZE, Highlight, HighlightFilter, HighlightPatch, MAX_PAGE_SIZE, NewHighlight,
    SortField, normalize_list,
};

// -- JWT Claims --

/// JWT claims. Decoded by the auth middleware and handed to handlers as the
/// request's auth context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Highlights --

/// Raw query string of `GET /highlights`. Turned into a [`HighlightFilter`]
/// with defaults and clamping applied.
#[derive(Debug, Default, Deserialize)]
pub struct HighlightListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl HighlightListQuery {
    pub fn into_filter(self) -> HighlightFilter {
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let sort = self
            .sort
            .as_deref()
            .map(SortField::parse_or_default)
            .unwrap_or_default();
        let page = self.page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
        let limit = self
            .limit
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
            .clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;

        HighlightFilter {
            category,
            search,
            sort,
            page,
            limit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightPage {
    pub highlights: Vec<Highlight>,
    pub total_pages: u64,
    pub current_page: u32,
    pub total: u64,
}

/// A multi-valued field as sent by clients: either a JSON array or a single
/// comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(items) => normalize_list(items),
            Self::Joined(joined) => normalize_list(joined.split(',')),
        }
    }
}

/// The admin form sends `featured` as a checkbox boolean; older clients send
/// 0/1.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    pub fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateHighlightRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<String>,
    pub categories: Option<StringList>,
    pub tags: Option<StringList>,
    pub featured: Option<Flag>,
}

impl CreateHighlightRequest {
    /// Checks required fields in a fixed order and reports the first one
    /// that is missing or blank.
    pub fn validate(self) -> Result<NewHighlight, String> {
        let title = required_text("title", self.title)?;
        let description = required_text("description", self.description)?;
        let thumbnail = required_text("thumbnail", self.thumbnail)?;
        let video_url = required_text("video_url", self.video_url)?;
        let duration = required_text("duration", self.duration)?;
        let categories = self.categories.map(StringList::into_vec).unwrap_or_default();
        if categories.is_empty() {
            return Err(missing("categories"));
        }

        Ok(NewHighlight {
            title,
            description,
            thumbnail,
            video_url,
            duration,
            categories,
            tags: self.tags.map(StringList::into_vec).unwrap_or_default(),
            featured: self.featured.is_some_and(Flag::as_bool),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHighlightRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<String>,
    pub categories: Option<StringList>,
    pub tags: Option<StringList>,
    pub featured: Option<Flag>,
}

impl UpdateHighlightRequest {
    /// Supplied fields must still satisfy the create rules: text fields
    /// cannot be blanked and categories cannot be emptied. Tags may be.
    pub fn validate(self) -> Result<HighlightPatch, String> {
        let categories = match self.categories {
            Some(list) => {
                let categories = list.into_vec();
                if categories.is_empty() {
                    return Err(missing("categories"));
                }
                Some(categories)
            }
            None => None,
        };

        let patch = HighlightPatch {
            title: optional_text("title", self.title)?,
            description: optional_text("description", self.description)?,
            thumbnail: optional_text("thumbnail", self.thumbnail)?,
            video_url: optional_text("video_url", self.video_url)?,
            duration: optional_text("duration", self.duration)?,
            categories,
            tags: self.tags.map(StringList::into_vec),
            featured: self.featured.map(Flag::as_bool),
        };

        if patch.is_empty() {
            return Err("No fields to update".to_string());
        }
        Ok(patch)
    }
}

fn missing(field: &str) -> String {
    format!("Missing required field: {field}")
}

fn required_text(field: &str, value: Option<String>) -> Result<String, String> {
    optional_text(field, value)?.ok_or_else(|| missing(field))
}

fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(missing(field)),
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub likes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Newsletter --

#[derive(Debug, Default, Deserialize)]
pub struct NewsletterRequest {
    pub email: Option<String>,
}
