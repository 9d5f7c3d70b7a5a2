use axum::{Json, extract::State};

use rugby_types::models::Statistics;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::with_db;

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let categories = with_db(&state, |db| db.categories()).await?;
    Ok(Json(categories))
}

pub async fn statistics(State(state): State<AppState>) -> Result<Json<Statistics>, ApiError> {
    let stats = with_db(&state, |db| db.statistics()).await?;
    Ok(Json(stats))
}
