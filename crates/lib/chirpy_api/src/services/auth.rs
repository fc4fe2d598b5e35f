//! Authentication service: register/login/refresh/revoke flows delegating
//! to `chirpy_core`.

use tracing::{debug, info};
use uuid::Uuid;

use chirpy_core::auth::password::{hash_password, verify_password, verify_placeholder};
use chirpy_core::models::auth::User;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{LoginResponse, TokenResponse, UserResponse};

/// Reject blank emails and passwords before touching storage.
fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password is required".into()));
    }
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    Ok(())
}

/// Register a new user account.
pub async fn register(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    validate_credentials(email, password)?;
    let pw_hash = hash_password(password)?;
    let user = state.users.create_user(email, &pw_hash).await?;
    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Authenticate with email + password, issuing an access token and opening
/// a new refresh session.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<LoginResponse> {
    validate_credentials(email, password)?;

    // Unknown email and wrong password produce the same error after the
    // same amount of bcrypt work.
    let Some(record) = state.users.find_by_email(email).await? else {
        verify_placeholder(password);
        debug!("login for unknown email");
        return Err(AppError::InvalidCredentials);
    };
    verify_password(password, &record.password_hash)?;

    let user = record.user;
    let token = state.tokens.issue(user.id, state.config.access_token_ttl)?;
    let refresh_token = state
        .sessions
        .create_session(user.id, state.config.refresh_token_ttl)
        .await?;

    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        user: UserResponse::from(user),
        token,
        refresh_token,
    })
}

/// Mint a new access token for a user whose refresh session was already
/// resolved by the refresh guard.
pub fn refresh(state: &AppState, user_id: Uuid) -> AppResult<TokenResponse> {
    let token = state.tokens.issue(user_id, state.config.access_token_ttl)?;
    Ok(TokenResponse { token })
}

/// Revoke the refresh session the caller presented.
pub async fn revoke(state: &AppState, refresh_token: &str, user_id: Uuid) -> AppResult<()> {
    state.sessions.revoke_session(refresh_token, user_id).await?;
    info!(user_id = %user_id, "refresh session revoked");
    Ok(())
}

/// Replace the caller's email and password.
pub async fn update_credentials(
    state: &AppState,
    user_id: Uuid,
    email: &str,
    password: &str,
) -> AppResult<User> {
    validate_credentials(email, password)?;
    let pw_hash = hash_password(password)?;
    state
        .users
        .update_credentials(user_id, email, &pw_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Log out everywhere by revoking every refresh session of a user.
pub async fn revoke_all(state: &AppState, user_id: Uuid) -> AppResult<u64> {
    let count = state.sessions.revoke_all_for_user(user_id).await?;
    info!(user_id = %user_id, count, "all refresh sessions revoked");
    Ok(count)
}
