//! # chirpy_api
//!
//! HTTP API library for Chirpy.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use chirpy_core::auth::jwt::TokenIssuer;
use chirpy_core::sessions::{MemorySessionStore, PgSessionStore, SessionStore};
use chirpy_core::users::{MemoryUserStore, PgUserStore, UserStore};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health, users, webhooks};

/// Shared application state passed to all handlers.
///
/// Everything here is either immutable after startup or does its own
/// synchronisation, so cloning the state per request is cheap and safe.
#[derive(Clone)]
pub struct AppState {
    /// User accounts.
    pub users: Arc<dyn UserStore>,
    /// Refresh sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Access token signer/verifier built from `config.jwt_secret`.
    pub tokens: Arc<TokenIssuer>,
    /// API configuration.
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let tokens = TokenIssuer::new(config.jwt_secret.expose_secret().as_bytes());
        Self {
            users,
            sessions,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }

    /// State backed by PostgreSQL.
    pub fn postgres(config: ApiConfig, pool: PgPool) -> Self {
        let sessions = PgSessionStore::new(pool.clone()).with_statement_timeout(config.request_timeout);
        Self::new(config, Arc::new(PgUserStore::new(pool)), Arc::new(sessions))
    }

    /// State backed by in-process maps; nothing survives a restart.
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
        )
    }
}

/// Run embedded database migrations.
///
/// Delegates to `chirpy_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    chirpy_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/healthz", get(health::healthz))
        .route("/api/users", post(users::create_user_handler))
        .route("/api/login", post(auth::login_handler))
        .route("/admin/reset", post(admin::reset_handler));

    // Access-token routes
    let bearer = Router::new()
        .route("/api/users", put(users::update_user_handler))
        .route("/api/revoke_all", post(auth::revoke_all_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Refresh-token routes
    let refresh = Router::new()
        .route("/api/refresh", post(auth::refresh_handler))
        .route("/api/revoke", post(auth::revoke_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_refresh,
        ));

    // Server-to-server routes
    let webhook = Router::new()
        .route("/api/polka/webhooks", post(webhooks::polka_webhook_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key,
        ));

    let timeout = state.config.request_timeout;

    Router::new()
        .merge(public)
        .merge(bearer)
        .merge(refresh)
        .merge(webhook)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
