//! Chirpy API server binary.

use std::time::Duration;

use chirpy_api::AppState;
use chirpy_api::config::{
    ApiConfig, Platform, access_token_ttl_from_secs, refresh_token_ttl_from_days,
    request_timeout_from_secs, resolve_jwt_secret,
};
use secrecy::SecretString;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

/// How often expired refresh sessions are deleted.
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "chirpy_api_server", about = "Chirpy API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/chirpy"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// JWT signing secret; when unset a generated secret is persisted in the
    /// user data directory.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Shared key the payment provider sends on webhook calls. Empty rejects
    /// every webhook call.
    #[arg(long, env = "POLKA_KEY", hide_env_values = true, default_value = "")]
    polka_key: String,

    /// Deployment platform; `dev` enables `/admin/reset`.
    #[arg(long, env = "PLATFORM", default_value = "prod")]
    platform: String,

    /// Access token lifetime in seconds (1 to 86400).
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = 3600)]
    access_token_ttl_secs: i64,

    /// Refresh session lifetime in days (1 to 365).
    #[arg(long, env = "REFRESH_TOKEN_TTL_DAYS", default_value_t = 60)]
    refresh_token_ttl_days: i64,

    /// Per-request deadline in seconds (1 to 300).
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    request_timeout_secs: u64,

    /// Keep users and sessions in memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| {
                    tracing_subscriber::EnvFilter::try_new("info,chirpy_api=debug,chirpy_core=debug")
                })?,
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        pg_connection_url: args.database_url,
        jwt_secret: resolve_jwt_secret(args.jwt_secret),
        polka_key: SecretString::from(args.polka_key),
        platform: Platform::parse(&args.platform),
        access_token_ttl: access_token_ttl_from_secs(args.access_token_ttl_secs)?,
        refresh_token_ttl: refresh_token_ttl_from_days(args.refresh_token_ttl_days)?,
        request_timeout: request_timeout_from_secs(args.request_timeout_secs)?,
    };

    info!(
        bind_addr = %config.bind_addr,
        platform = ?config.platform,
        in_memory = args.in_memory,
        "starting chirpy_api_server"
    );

    let state = if args.in_memory {
        warn!("using in-memory storage; users and sessions are lost on exit");
        AppState::in_memory(config)
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.pg_connection_url)
            .await?;

        info!("running database migrations");
        chirpy_api::migrate(&pool).await?;

        AppState::postgres(config, pool)
    };

    tokio::spawn(purge_expired_sessions(state.clone()));

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    let app = chirpy_api::router(state);

    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Periodically delete refresh sessions past their expiry.
async fn purge_expired_sessions(state: AppState) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match state.sessions.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "purged expired refresh sessions"),
            Err(e) => error!(error = %e, "failed to purge expired refresh sessions"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
