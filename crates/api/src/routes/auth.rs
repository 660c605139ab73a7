use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use taskflow_db::models::{SystemRole, User};
use taskflow_services::auth::{AuthError, TokenPair};
use tracing::info;
use validator::Validate;

use super::{hex, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "must be 3 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub display_name: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub system_role: SystemRole,
    pub is_active: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: hex(user.id),
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            system_role: user.system_role,
            is_active: user.is_active,
            last_login_at: user.last_login_at.map(rfc3339),
            created_at: rfc3339(user.created_at),
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();
    let system_role = if state.settings.admin.is_super_admin_email(&email) {
        SystemRole::SuperAdmin
    } else {
        SystemRole::User
    };
    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(
            email,
            body.username.trim().to_string(),
            body.display_name.trim().to_string(),
            password_hash,
            system_role,
        )
        .await?;
    info!(user_id = ?user.id, role = system_role.as_str(), "User registered");

    let (headers, response) = issue(&state, user)?;
    Ok((StatusCode::CREATED, headers, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let user = if let Some(ref username) = body.username {
        state.users.find_by_username(username).await
    } else if let Some(ref email) = body.email {
        state.users.find_by_email(&email.trim().to_lowercase()).await
    } else {
        return Err(ApiError::BadRequest(
            "Either username or email is required".to_string(),
        ));
    }
    .map_err(|_| AuthError::InvalidCredentials)?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or(AuthError::InvalidCredentials)?;
    if !state.auth.verify_password(&body.password, password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.is_active {
        return Err(AuthError::Inactive.into());
    }

    if let Some(user_id) = user.id {
        state.users.touch_login(user_id).await?;
    }

    let (headers, response) = issue(&state, user)?;
    Ok((headers, Json(response)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;
    let user = state
        .users
        .base
        .find_by_id(claims.user_id()?)
        .await
        .map_err(|_| AuthError::InvalidToken("Unknown user".to_string()))?;
    if !user.is_active {
        return Err(AuthError::Inactive.into());
    }

    let (headers, response) = issue(&state, user)?;
    Ok((headers, Json(response)))
}

pub async fn me(auth: AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(auth.user))
}

fn issue(state: &AppState, user: User) -> Result<(HeaderMap, AuthResponse), ApiError> {
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("User without id".to_string()))?;
    let tokens = state.auth.generate_tokens(user_id, &user.email)?;
    let headers = session_cookie(&tokens)?;

    Ok((
        headers,
        AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: UserResponse::from(user),
        },
    ))
}

fn session_cookie(tokens: &TokenPair) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        tokens.access_token, tokens.expires_in
    );
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("Invalid cookie header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}
