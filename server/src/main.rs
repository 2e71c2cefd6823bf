//! Outpost Server - incremental pull-sync for offline field devices.
//!
//! Devices pull location-scoped deltas of participants, visits, biometric
//! templates, and images over HTTP, resuming from a cursor; sync failures
//! they hit are reported back to an error ledger.

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod images;
mod routes;

use crate::config::Config;
use crate::db::Pool;
use axum::Router;
use outpost_engine::AddressFieldMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
    pub address_fields: Arc<AddressFieldMap>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outpost_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Outpost Server on {}:{}", config.host, config.port);

    // Validate the configured address fields up front; a typo should fail
    // startup, not the first participant page
    let address_fields = match &config.address_fields {
        Some(names) => AddressFieldMap::from_names(names)?,
        None => AddressFieldMap::all_fields(),
    };

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    // Build application state
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        address_fields: Arc::new(address_fields),
    };

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
