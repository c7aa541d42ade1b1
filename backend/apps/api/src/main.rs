//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-path errors are the typed
//! results inside the auth crate.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audit::{AuditStore, AuditTrail, HandlerRegistry};
use auth::{AuthConfig, SqliteStore, TokenStore, auth_router};
use platform::clock::{Clock, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,audit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = SqliteStore::new(pool.clone());

    let mut config = AuthConfig::default();
    if let Ok(base_url) = env::var("BASE_URL") {
        config.base_url = base_url;
    }
    if let Ok(secure) = env::var("SECURE_COOKIE") {
        config.cookie_secure = secure == "true";
    }
    config.cron_api_token = env::var("CRON_API_TOKEN").unwrap_or_default();
    let config = config;

    // Startup cleanup: remove expired tokens
    // Errors here should not prevent server startup
    let sweep_store = TokenStore::new(
        Arc::new(store.clone()),
        Arc::new(config.clone()),
        clock.clone(),
    );
    match sweep_store.sweep_expired().await {
        Ok(deleted) => {
            tracing::info!(tokens_deleted = deleted, "Expired token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Expired token cleanup failed, continuing anyway");
        }
    }

    // Audit trail: handlers are registered here so initialization order
    // stays deterministic; none are wired up yet
    let registry = HandlerRegistry::new();
    let (trail, worker) = AuditTrail::new(AuditStore::new(pool.clone()), registry, clock.clone());
    tokio::spawn(worker.run());

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(store, trail, config, clock))
        .layer(TraceLayer::new_for_http());

    // Start server
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
