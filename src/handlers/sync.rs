use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};

use crate::{
    error::{AppError, Result},
    models::envelope::Envelope,
    models::session::Session,
    services::reconcile,
    state::AppState,
};

/// The reconciliation round trip.
///
/// The client submits its entire local envelope set; an empty body is a
/// valid pure-pull. The response is always the owner's full current set:
/// `204 No Content` when the owner has zero items, otherwise a JSON array.
#[axum::debug_handler]
pub async fn sync(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<Response> {
    let incoming: Vec<Envelope> = if body.is_empty() {
        Vec::new()
    } else {
        sonic_rs::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("malformed envelope set: {e}")))?
    };

    tracing::debug!(
        user = %session.user_id,
        submitted = incoming.len(),
        "sync round trip"
    );

    let set = reconcile::merge_owner_set(&state.store, session.user_id, incoming).await?;

    if set.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body = sonic_rs::to_string(&set)
        .map_err(|e| AppError::Internal(format!("response serialization failed: {e}")))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
