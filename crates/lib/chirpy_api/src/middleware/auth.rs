//! Request guards for Bearer access tokens, Bearer refresh tokens and the
//! `ApiKey` shared secret.
//!
//! Each guard either rejects the request before the handler runs or
//! attaches a typed context value to the request extensions, which handlers
//! read back with `Extension<T>`.

use std::fmt;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::services::api_key::api_key_matches;

/// Scheme keyword for access and refresh tokens.
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme keyword for server-to-server shared secrets.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Identity verified from an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Identity resolved from a live refresh session, plus the raw token so the
/// revoke handler knows exactly which session to end.
#[derive(Clone)]
pub struct RefreshSession {
    pub user_id: Uuid,
    pub refresh_token: String,
}

impl fmt::Debug for RefreshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSession")
            .field("user_id", &self.user_id)
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Pull the credential out of `Authorization: <scheme> <credential>`.
///
/// A missing header, a different scheme, an empty credential or any extra
/// whitespace-separated part is a malformed request.
pub fn extract_authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::MalformedRequest("Missing authorization header".into()))?
        .to_str()
        .map_err(|_| AppError::MalformedRequest("Invalid authorization header".into()))?;

    let (keyword, credential) = header
        .split_once(' ')
        .ok_or_else(|| AppError::MalformedRequest("Invalid authorization header".into()))?;
    if keyword != scheme {
        return Err(AppError::MalformedRequest(format!(
            "Authorization header should be: {scheme} <credential>"
        )));
    }
    if credential.is_empty() || credential.contains(char::is_whitespace) {
        return Err(AppError::MalformedRequest("Invalid authorization header".into()));
    }
    Ok(credential)
}

/// Storage trouble inside a guard is logged and then treated as a failed
/// authentication.
fn fail_closed(e: chirpy_core::auth::AuthError) -> AppError {
    if e.is_storage_failure() {
        error!(kind = e.kind(), error = %e, "session lookup failed; rejecting request");
        AppError::Unauthorized
    } else {
        AppError::from(e)
    }
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the JWT,
/// and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_authorization(request.headers(), BEARER_SCHEME)?;
    let user_id = state.tokens.verify(token)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Axum middleware: extracts `Authorization: Bearer <refresh token>`, resolves
/// it against the session store, and injects `RefreshSession`.
pub async fn require_refresh(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_authorization(request.headers(), BEARER_SCHEME)?.to_string();
    let user_id = state
        .sessions
        .resolve_session(&token)
        .await
        .map_err(fail_closed)?;

    request.extensions_mut().insert(RefreshSession {
        user_id,
        refresh_token: token,
    });

    Ok(next.run(request).await)
}

/// Axum middleware: checks `Authorization: ApiKey <key>` against the
/// configured webhook key. The caller is a trusted system, so no identity is
/// attached.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = extract_authorization(request.headers(), API_KEY_SCHEME)?;
    if !api_key_matches(&state.config.polka_key, key) {
        debug!("api key mismatch");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}
