use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::Result,
    models::session::Session,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for sign-up and sign-in.
#[derive(Deserialize, Debug)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

/// The response payload for authentication-related requests.
///
/// `user_id` tells the client which owner id to stamp on envelopes it
/// creates locally.
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
}

fn session_cookie(session_id: Uuid, ttl_hours: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new("session_id", session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::hours(ttl_hours));
    cookie.set_path("/");
    cookie
}

/// Handles user registration: establishes the verifier hash, then opens a
/// session.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<AuthRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(email = %payload.email, "register attempt");
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let user = auth_service::create_user(&state.store, &payload.email, &payload.password).await?;

    let session = state.sessions.create_session(user.id)?;
    cookies.add(session_cookie(session.id, state.config.session_ttl_hours));

    let response = AuthResponse {
        success: true,
        message: "registration successful".to_string(),
        user_id: user.id,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<AuthRequest>,
) -> Result<Response> {
    tracing::info!(email = %payload.email, "login attempt");
    validate_email(&payload.email)?;

    let user =
        auth_service::authenticate_user(&state.store, &payload.email, &payload.password).await?;

    let session = state.sessions.create_session(user.id)?;
    cookies.add(session_cookie(session.id, state.config.session_ttl_hours));

    tracing::info!(user = %user.id, "user logged in");

    let response = AuthResponse {
        success: true,
        message: "login successful".to_string(),
        user_id: user.id,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout: revokes the session and clears the cookie.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Result<Response> {
    state.sessions.delete_session(session.id);

    let mut expired = Cookie::new("session_id", "");
    expired.set_max_age(Duration::seconds(0));
    expired.set_path("/");
    cookies.remove(expired);

    tracing::info!(user = %session.user_id, "user logged out");

    let response = AuthResponse {
        success: true,
        message: "logout successful".to_string(),
        user_id: session.user_id,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
