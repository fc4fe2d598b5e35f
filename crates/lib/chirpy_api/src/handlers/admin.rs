//! Development-only admin endpoints.

use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::config::Platform;
use crate::error::{AppError, AppResult};

/// `POST /admin/reset` — delete every user and their sessions. Only
/// available when running with `PLATFORM=dev`.
pub async fn reset_handler(State(state): State<AppState>) -> AppResult<&'static str> {
    if state.config.platform != Platform::Dev {
        return Err(AppError::Forbidden("Reset is only allowed in dev".into()));
    }
    let sessions = state.sessions.delete_all().await?;
    let removed = state.users.delete_all().await?;
    warn!(removed, sessions, "all users and sessions deleted");
    Ok("Reset OK")
}
