//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chirpy_core::auth::AuthError;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::MalformedRequest(m) => {
                (StatusCode::UNAUTHORIZED, "malformed_request", m.as_str())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized"),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials",
            ),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

/// Internal auth taxonomy to boundary error.
///
/// | `AuthError`                                    | `AppError`           | Status |
/// |------------------------------------------------|----------------------|--------|
/// | `PasswordMismatch`, `MalformedDigest`          | `InvalidCredentials` | 401    |
/// | `InvalidToken`, `*Session`, `SessionOwnership` | `Unauthorized`       | 401    |
/// | `Conflict`                                     | `Conflict`           | 409    |
/// | `Hashing`, `TokenIssue`, `InvalidTtl`          | `Internal`           | 500    |
/// | `Storage`, `StorageTimeout`                    | `Internal`           | 500    |
///
/// The internal kind is logged here so the collapse loses nothing.
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::PasswordMismatch => {
                debug!(kind = e.kind(), "credential check failed");
                AppError::InvalidCredentials
            }
            AuthError::MalformedDigest(ref detail) => {
                warn!(kind = e.kind(), detail = %detail, "stored password hash is corrupt");
                AppError::InvalidCredentials
            }
            AuthError::InvalidToken
            | AuthError::UnknownSession
            | AuthError::ExpiredSession
            | AuthError::RevokedSession
            | AuthError::SessionOwnership => {
                debug!(kind = e.kind(), "authentication rejected");
                AppError::Unauthorized
            }
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::Hashing(_)
            | AuthError::TokenIssue(_)
            | AuthError::InvalidTtl(_)
            | AuthError::Storage(_)
            | AuthError::StorageTimeout => {
                error!(kind = e.kind(), error = %e, "internal auth failure");
                AppError::Internal(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn session_failures_collapse_to_generic_unauthorized() {
        for e in [
            AuthError::UnknownSession,
            AuthError::ExpiredSession,
            AuthError::RevokedSession,
            AuthError::InvalidToken,
        ] {
            let response = AppError::from(e).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["error"], "unauthorized");
            assert_eq!(body["message"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn wrong_password_and_corrupt_hash_look_the_same() {
        let a = AppError::from(AuthError::PasswordMismatch).into_response();
        let b = AppError::from(AuthError::MalformedDigest("bad".into())).into_response();
        assert_eq!(a.status(), b.status());
        assert_eq!(body_json(a).await, body_json(b).await);
    }

    #[tokio::test]
    async fn storage_detail_is_not_exposed() {
        let response = AppError::from(AuthError::Storage(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn core_failures_without_a_client_cause_are_internal() {
        for e in [
            AuthError::InvalidTtl("overflow".into()),
            AuthError::TokenIssue("encode".into()),
            AuthError::Hashing("rng".into()),
            AuthError::StorageTimeout,
        ] {
            let response = AppError::from(e).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn conflict_maps_to_409() {
        let response = AppError::from(AuthError::Conflict("taken".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
