//! Auth routes — signup, login, logout.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the REST surface of the identity collaborator: it exchanges
//! credentials for an opaque bearer token. The websocket handshake presents
//! that token; nothing card-related lives here.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::services::{auth as auth_svc, session};
use crate::services::auth::AuthError;
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the `Authorization: Bearer` header.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

pub(crate) fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(StatusCode::UNAUTHORIZED);
        };

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub(crate) fn auth_error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingField(_) | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_error_response(err: &AuthError) -> Response {
    let status = auth_error_status(err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "auth database failure");
        return (status, Json(serde_json::json!({ "message": "internal error" }))).into_response();
    }
    (status, Json(serde_json::json!({ "message": err.to_string() }))).into_response()
}

async fn issue_token(state: &AppState, user: session::SessionUser) -> Response {
    match session::create_session(&state.pool, user.id).await {
        Ok(token) => Json(serde_json::json!({ "token": token, "user": user })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to create session").into_response()
        }
    }
}

/// `POST /auth/signup` — register and return `{token, user}`.
pub async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    match auth_svc::signup(&state.pool, &req.name, &req.email, &req.password).await {
        Ok(user) => issue_token(&state, user).await,
        Err(e) => auth_error_response(&e),
    }
}

/// `POST /auth/login` — authenticate and return `{token, user}`.
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match auth_svc::login(&state.pool, &req.email, &req.password).await {
        Ok(user) => issue_token(&state, user).await,
        Err(e) => auth_error_response(&e),
    }
}

/// `POST /auth/logout` — delete the presented session.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let _ = session::delete_session(&state.pool, &auth.token).await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
