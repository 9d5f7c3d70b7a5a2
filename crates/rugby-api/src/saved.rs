use axum::{
    Extension, Json,
    extract::{Path, State},
};

use rugby_types::api::{Claims, MessageResponse};
use rugby_types::models::{Highlight, SaveOutcome};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_highlight_id, with_db};

/// POST /highlights/{id}/save: idempotent, a repeat save reports it.
pub async fn save_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_highlight_id(&id)?;
    let user_id = claims.sub.to_string();

    let message = match with_db(&state, move |db| db.save_highlight(&user_id, id)).await? {
        SaveOutcome::Saved => "Highlight saved successfully",
        SaveOutcome::AlreadySaved => "Highlight already saved",
        SaveOutcome::HighlightMissing => return Err(ApiError::not_found("Highlight")),
    };
    Ok(Json(MessageResponse::new(message)))
}

/// DELETE /highlights/{id}/save: succeeds whether or not it was saved.
pub async fn unsave_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_highlight_id(&id)?;
    let user_id = claims.sub.to_string();

    with_db(&state, move |db| db.unsave_highlight(&user_id, id)).await?;
    Ok(Json(MessageResponse::new("Highlight removed from saved list")))
}

/// GET /me/saved
pub async fn saved_highlights(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Highlight>>, ApiError> {
    let user_id = claims.sub.to_string();
    let highlights = with_db(&state, move |db| db.saved_highlights(&user_id)).await?;
    Ok(Json(highlights))
}
