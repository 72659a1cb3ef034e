//! Session lifecycle handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::metrics::set_active_sessions;
use crate::session::SessionSnapshot;
use crate::state::AppState;

/// Create an empty session.
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state.sessions.create().await;
    set_active_sessions(state.sessions.len().await);
    (StatusCode::CREATED, Json(session.snapshot().await))
}

/// Full snapshot of both suites.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = state.sessions.get(session_id).await?;
    Ok(Json(session.snapshot().await))
}

/// Cancel in-flight work and drop the session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.sessions.remove(session_id).await?;
    set_active_sessions(state.sessions.len().await);
    Ok(StatusCode::NO_CONTENT)
}
