use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::state::AppState;

/// Extracts the session token from the `session_id` cookie or an
/// `Authorization: Bearer` header.
fn extract_session_token(cookies: &Cookies, headers: &HeaderMap) -> Option<Uuid> {
    if let Some(cookie) = cookies.get("session_id") {
        if let Ok(id) = Uuid::parse_str(cookie.value()) {
            return Some(id);
        }
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// A middleware that requires a valid, unexpired session.
///
/// On success the resolved [`crate::models::session::Session`] is inserted
/// into request extensions; otherwise the request is rejected with 401
/// before any body is read.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = extract_session_token(&cookies, request.headers()).ok_or_else(|| {
        tracing::warn!("no session credential on request");
        StatusCode::UNAUTHORIZED
    })?;

    let session = state.sessions.get_session(session_id).map_err(|e| {
        tracing::warn!("session rejected: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    tracing::debug!(user = %session.user_id, "session accepted");
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
