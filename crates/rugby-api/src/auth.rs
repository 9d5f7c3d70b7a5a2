use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use rugby_db::Database;
use rugby_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use rugby_types::validate::{validate_email, validate_password, validate_username};

use crate::error::ApiError;
use crate::with_db;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenKeys,
}

/// Issues and verifies the HS256 bearer tokens that carry a request's auth
/// context.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp: (chrono::Utc::now() + self.ttl).timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    validate_username(&username).map_err(|e| ApiError::Validation(e.into()))?;
    validate_email(&email).map_err(|e| ApiError::Validation(e.into()))?;
    validate_password(&req.password).map_err(|e| ApiError::Validation(e.into()))?;

    // Check if username or email is taken
    let (name_taken, email_taken) = {
        let (username, email) = (username.clone(), email.clone());
        with_db(&state, move |db| {
            Ok((
                db.get_user_by_username(&username)?.is_some(),
                db.get_user_by_email(&email)?.is_some(),
            ))
        })
        .await?
    };
    if name_taken {
        return Err(ApiError::Conflict("Username already taken".into()));
    }
    if email_taken {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();

    {
        let (username, email) = (username.clone(), email.clone());
        with_db(&state, move |db| {
            db.create_user(&user_id.to_string(), &username, &email, &password_hash)
        })
        .await?;
    }
    info!("Registered user {} ({})", username, user_id);

    let token = state.tokens.issue(user_id, &username)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let username = req.username.trim().to_string();

    let user = with_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("Stored hash for {} is unreadable: {}", user.username, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(anyhow::Error::from)?;
    let token = state.tokens.issue(user_id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id,
        username: user.username,
        token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new("unit-test-secret", chrono::Duration::hours(1));
        let id = Uuid::new_v4();
        let token = keys.issue(id, "flyhalf").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "flyhalf");
    }

    #[test]
    fn foreign_or_expired_tokens_fail() {
        let keys = TokenKeys::new("unit-test-secret", chrono::Duration::hours(1));
        let other = TokenKeys::new("some-other-secret", chrono::Duration::hours(1));
        let token = other.issue(Uuid::new_v4(), "winger").unwrap();
        assert!(keys.verify(&token).is_err());
        assert!(keys.verify("not.a.jwt").is_err());

        let expired = TokenKeys::new("unit-test-secret", chrono::Duration::hours(-2));
        let token = expired.issue(Uuid::new_v4(), "lock").unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
