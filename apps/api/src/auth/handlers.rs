use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::errors::{AppError, AppJson};
use crate::models::user::NewUser;
use crate::state::AppState;

const AVATAR_PLACEHOLDER_BASE: &str = "https://placehold.co/120x120/0d47a1/ffffff?text=";

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub user_id: Uuid,
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let name = required(request.name, "name")?;
    let email = required(request.email, "email")?;
    let password = required(request.password, "password")?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(password).await?;
    let avatar = Some(placeholder_avatar(&name));
    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            phone: request.phone.filter(|p| !p.trim().is_empty()),
            password_hash,
            avatar,
        })
        .await?;

    info!("New signup: user {}", user.id);
    let token = state.tokens.issue(user.id, &user.email)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user_id: user.id,
        }),
    ))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let user = state
        .store
        .find_user_by_email(email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, user.password_hash.clone()).await? {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, &user.email)?;
    Ok(Json(TokenResponse {
        token,
        user_id: user.id,
    }))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Placeholder image showing the first letter of the user's name.
fn placeholder_avatar(name: &str) -> String {
    let initial: String = name.chars().take(1).collect();
    format!("{AVATAR_PLACEHOLDER_BASE}{}", urlencoding::encode(&initial))
}
