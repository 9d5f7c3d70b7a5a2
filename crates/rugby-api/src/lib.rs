pub mod auth;
pub mod error;
pub mod highlights;
pub mod middleware;
pub mod newsletter;
pub mod routes;
pub mod saved;
pub mod stats;

use rugby_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

pub use routes::router;

/// Run blocking DB work off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
        .map_err(ApiError::from)
}

/// Highlight ids are positive integers. Anything else cannot name a record.
pub(crate) fn parse_highlight_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::not_found("Highlight"))
}
