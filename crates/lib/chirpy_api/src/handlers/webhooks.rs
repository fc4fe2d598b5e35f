//! Payment provider webhooks.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::PolkaWebhookRequest;

/// Event sent when a user buys the upgrade.
pub const EVENT_USER_UPGRADED: &str = "user.upgraded";

/// `POST /api/polka/webhooks` — apply a payment event. Requires the shared
/// webhook key. Unknown events and unknown users are acknowledged so the
/// provider does not retry them.
pub async fn polka_webhook_handler(
    State(state): State<AppState>,
    body: Result<Json<PolkaWebhookRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(body) = body.map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;

    if body.event != EVENT_USER_UPGRADED {
        debug!(event = %body.event, "ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let data = body
        .data
        .ok_or_else(|| AppError::Validation("Missing event data".into()))?;
    if state.users.upgrade(data.user_id).await? {
        info!(user_id = %data.user_id, "user upgraded");
    } else {
        warn!(user_id = %data.user_id, "webhook referenced unknown user");
    }
    Ok(StatusCode::NO_CONTENT)
}
