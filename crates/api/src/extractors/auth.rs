use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use bson::oid::ObjectId;
use taskflow_db::models::User;
use taskflow_services::Principal;

use crate::{error::ApiError, state::AppState};

/// The authenticated, active user behind the request (bearer token or
/// `access_token` cookie).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub user: User,
    pub principal: Principal,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let claims = app_state.auth.verify_access_token(&token)?;
        let user_id = claims.user_id()?;

        let user = app_state
            .users
            .base
            .find_by_id(user_id)
            .await
            .map_err(|_| ApiError::Unauthorized("Unknown user".to_string()))?;
        if !user.is_active {
            return Err(ApiError::Forbidden("Account is deactivated".to_string()));
        }

        let principal = Principal::new(user_id, user.system_role);
        Ok(AuthUser {
            user_id,
            user,
            principal,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                cookie
                    .trim()
                    .strip_prefix("access_token=")
                    .map(|s| s.to_string())
            })
        })
}
