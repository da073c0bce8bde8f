//! Kawani API Server
//!
//! Main entry point for the leave ledger service.

use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kawani_api::{AppState, create_router};
use kawani_db::{LeaveRepository, LeaveTypeCache, connect_with};
use kawani_shared::{AppConfig, JwtConfig, JwtService};

/// Upper bound on cached leave types.
const LEAVE_TYPE_CACHE_CAPACITY: u64 = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kawani=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let leave_types = LeaveTypeCache::with_config(
        LEAVE_TYPE_CACHE_CAPACITY,
        config.leave.leave_type_cache_ttl_secs,
    );
    let store = LeaveRepository::with_cache(db, leave_types);

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let state = AppState::new(store, jwt_service, config.leave.notification_capacity);
    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
