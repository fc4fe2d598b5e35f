//! User account handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CredentialsRequest, UserResponse};
use crate::services::auth;

/// `POST /api/users` — create a new user account.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = auth::register(&state, &body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `PUT /api/users` — change the caller's email and password. Requires an
/// access token.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<UserResponse>> {
    let updated =
        auth::update_credentials(&state, user.user_id, &body.email, &body.password).await?;
    Ok(Json(updated.into()))
}
