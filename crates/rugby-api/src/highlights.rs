use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use rugby_types::api::{
    Claims, CreateHighlightRequest, HighlightListQuery, HighlightPage, LikeResponse,
    MessageResponse, UpdateHighlightRequest,
};
use rugby_types::models::{FEATURED_LIMIT, Highlight};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_highlight_id, with_db};

/// GET /highlights: one page of the filtered listing.
pub async fn list_highlights(
    State(state): State<AppState>,
    query: Result<Query<HighlightListQuery>, QueryRejection>,
) -> Result<Json<HighlightPage>, ApiError> {
    let Query(query) = query?;
    let filter = query.into_filter();

    let (highlights, total) = {
        let filter = filter.clone();
        with_db(&state, move |db| db.list_highlights(&filter)).await?
    };

    Ok(Json(HighlightPage {
        highlights,
        total_pages: filter.total_pages(total),
        current_page: filter.page,
        total,
    }))
}

/// GET /highlights/featured: newest featured records.
pub async fn featured_highlights(
    State(state): State<AppState>,
) -> Result<Json<Vec<Highlight>>, ApiError> {
    let highlights = with_db(&state, |db| db.featured_highlights(FEATURED_LIMIT)).await?;
    Ok(Json(highlights))
}

/// GET /highlights/{id}: every fetch counts as a view, including refreshes.
pub async fn get_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Highlight>, ApiError> {
    let id = parse_highlight_id(&id)?;
    let highlight = with_db(&state, move |db| db.record_view(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Highlight"))?;
    Ok(Json(highlight))
}

pub async fn create_highlight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateHighlightRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new = req.validate().map_err(ApiError::Validation)?;

    let highlight = with_db(&state, move |db| db.create_highlight(&new)).await?;
    info!("Highlight {} created by {}", highlight.id, claims.username);

    Ok((StatusCode::CREATED, Json(highlight)))
}

pub async fn update_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateHighlightRequest>, JsonRejection>,
) -> Result<Json<Highlight>, ApiError> {
    let id = parse_highlight_id(&id)?;
    let Json(req) = payload?;
    let patch = req.validate().map_err(ApiError::Validation)?;

    let highlight = with_db(&state, move |db| db.update_highlight(id, &patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Highlight"))?;
    info!("Highlight {} updated by {}", id, claims.username);

    Ok(Json(highlight))
}

pub async fn delete_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_highlight_id(&id)?;

    if !with_db(&state, move |db| db.delete_highlight(id)).await? {
        return Err(ApiError::not_found("Highlight"));
    }
    info!("Highlight {} deleted by {}", id, claims.username);

    Ok(Json(MessageResponse::new("Highlight deleted successfully")))
}

/// POST /highlights/{id}/like: one more like per call, no per-user dedup.
pub async fn like_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<LikeResponse>, ApiError> {
    let id = parse_highlight_id(&id)?;
    let likes = with_db(&state, move |db| db.like_highlight(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Highlight"))?;
    Ok(Json(LikeResponse { likes }))
}
