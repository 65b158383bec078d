use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::{request::Parts, StatusCode},
};
use serde::Deserialize;
use tracing::{error, warn};
use uuid::Uuid;

use super::{jwt::JwtKeys, repo_types::User, services::authenticate_token};
use crate::{
    state::AppState,
    web::{read_cookie, SESSION_COOKIE},
};

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

/// Extracts and validates a bearer JWT, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = bearer_token(parts).ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header".to_string(),
        ))?;

        match keys.verify_access(token) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ))
            }
        }
    }
}

/// Actor of a browser request: resolved from the session cookie or a bearer token.
///
/// Never rejects a guest; `None` means unauthenticated.
pub struct CurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts).or_else(|| read_cookie(&parts.headers, SESSION_COOKIE))
        else {
            return Ok(CurrentUser(None));
        };

        let user_id = match JwtKeys::from_ref(state).verify_access(token) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "ignoring invalid session token");
                return Ok(CurrentUser(None));
            }
        };

        let user = state.repo.find_user(user_id).await.map_err(|e| {
            error!(error = %e, %user_id, "load current user failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        })?;
        if user.is_none() {
            warn!(%user_id, "session refers to a missing user");
        }
        Ok(CurrentUser(user))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiCredentials {
    user_email: Option<String>,
    user_token: Option<String>,
}

/// User authenticated by `user_email` + `user_token` query parameters.
pub struct ApiUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid email or authentication token".to_string(),
            )
        };

        let Query(creds) = Query::<ApiCredentials>::try_from_uri(&parts.uri)
            .map_err(|_| unauthorized())?;
        let (Some(email), Some(token)) = (creds.user_email, creds.user_token) else {
            return Err(unauthorized());
        };

        match authenticate_token(&*state.repo, &email, &token).await {
            Ok(Some(user)) => Ok(ApiUser(user)),
            Ok(None) => {
                warn!(email = %email, "api token rejected");
                Err(unauthorized())
            }
            Err(e) => {
                error!(error = %e, "api token lookup failed");
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ))
            }
        }
    }
}
