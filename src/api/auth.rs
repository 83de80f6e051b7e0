use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::domain::{Portfolio, TimeMs, User};
use crate::error::AppError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: usize,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub created_at: i64,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        UserDto {
            id: user.id.to_string(),
            username: user.username.clone(),
            created_at: user.created_at.as_i64(),
        }
    }
}

/// Create an account and its opening portfolio, then hand back a token.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = req.username.trim().to_string();
    if username.len() < 3 || username.len() > 32 {
        return Err(AppError::BadRequest(
            "username must be 3-32 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::BadRequest(
            "username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        username,
        password_hash: hash_password(&req.password)?,
        created_at: TimeMs::now(),
    };

    if !state.repo.insert_user(&user).await? {
        return Err(AppError::BadRequest("username is already taken".to_string()));
    }

    let portfolio = Portfolio::opening(user.id, state.config.starting_cash, user.created_at);
    state.repo.insert_portfolio(&portfolio).await?;

    tracing::info!(username = %user.username, "registered new player");

    let (token, expires_in) = state.jwt.generate_token(&user)?;
    Ok(Json(AuthResponse {
        token,
        expires_in,
        user: UserDto::from(&user),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .repo
        .find_user_by_username(req.username.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let (token, expires_in) = state.jwt.generate_token(&user)?;
    Ok(Json(AuthResponse {
        token,
        expires_in,
        user: UserDto::from(&user),
    }))
}
