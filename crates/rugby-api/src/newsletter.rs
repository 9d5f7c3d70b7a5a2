use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use rugby_types::api::{MessageResponse, NewsletterRequest};
use rugby_types::models::SubscribeOutcome;
use rugby_types::validate::validate_email;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::with_db;

pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<NewsletterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let email = req.email.map(|e| e.trim().to_string()).unwrap_or_default();
    validate_email(&email).map_err(|_| ApiError::Validation("Invalid email address".into()))?;

    let outcome = {
        let email = email.clone();
        with_db(&state, move |db| db.subscribe(&email)).await?
    };

    match outcome {
        SubscribeOutcome::Created => {
            info!("Newsletter subscription for {}", email);
            Ok((StatusCode::CREATED, Json(MessageResponse::new("Subscribed successfully"))))
        }
        SubscribeOutcome::Reactivated => {
            info!("Newsletter subscription reactivated for {}", email);
            Ok((StatusCode::OK, Json(MessageResponse::new("Resubscribed successfully"))))
        }
        SubscribeOutcome::AlreadyActive => {
            Err(ApiError::Conflict("Email already subscribed".into()))
        }
    }
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    payload: Result<Json<NewsletterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let email = req
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email required".into()))?;

    if !with_db(&state, move |db| db.unsubscribe(&email)).await? {
        return Err(ApiError::NotFound("Email not found in subscription list".into()));
    }
    Ok(Json(MessageResponse::new("Unsubscribed successfully")))
}
