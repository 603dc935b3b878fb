//! Tally Server - inventory reconciliation over HTTP.
//!
//! Serves item and stock-movement endpoints backed by PostgreSQL, using the
//! tally-engine rules for every quantity change, and pushes low-stock alerts
//! to WebSocket subscribers.

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod ledger;
mod notify;
mod routes;
mod websocket;

use crate::config::Config;
use crate::db::Pool;
use crate::ledger::{PgLedger, StockService};
use crate::notify::LowStockBroadcaster;
use crate::websocket::ConnectionManager;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The stock service as wired in production.
pub type Stock = StockService<PgLedger, LowStockBroadcaster>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
    pub conn_manager: Arc<ConnectionManager>,
    pub stock: Arc<Stock>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Tally Server on {}:{}", config.host, config.port);

    // Create database pool
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    // Build application state
    let conn_manager = ConnectionManager::new_shared();
    let stock = StockService::new(
        PgLedger::new(pool.clone(), config.lock_timeout),
        LowStockBroadcaster::new(Arc::clone(&conn_manager)),
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        conn_manager,
        stock: Arc::new(stock),
    };

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
