//! Session request handlers: login, refresh, revoke.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::{AuthenticatedUser, RefreshSession};
use crate::models::{CredentialsRequest, LoginResponse, TokenResponse};
use crate::services::auth;

/// `POST /api/login` — exchange email + password for an access token and a
/// refresh token.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<LoginResponse>> {
    let resp = auth::login(&state, &body.email, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /api/refresh` — mint a new access token. Requires a live refresh
/// session.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(session): Extension<RefreshSession>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(&state, session.user_id)?;
    Ok(Json(resp))
}

/// `POST /api/revoke` — end the presented refresh session.
pub async fn revoke_handler(
    State(state): State<AppState>,
    Extension(session): Extension<RefreshSession>,
) -> AppResult<StatusCode> {
    auth::revoke(&state, &session.refresh_token, session.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/revoke_all` — end every refresh session of the caller.
/// Requires an access token.
pub async fn revoke_all_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<StatusCode> {
    auth::revoke_all(&state, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
