//! Ration Shop Service - Main Application Entry Point
//!
//! This is a REST API server for a ration-shop locator. End users log in with
//! a phone number and a one-time passcode; shop owners log in with a password
//! and manage their shop's stock.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store
//! - **Authentication**: OTP for users, Argon2 passwords for shops, JWT sessions
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the store (and run migrations for PostgreSQL)
//! 3. Seed sample shops into an empty store
//! 4. Start the OTP expiry sweep
//! 5. Build HTTP router with routes and middleware, then serve

mod clock;
mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    clock::{Clock, SystemClock},
    config::{Config, ConfigError, StoreBackend},
    services::{
        credentials::{Argon2Hasher, CredentialHasher},
        seed::seed_sample_shops,
        sms::{HttpSmsSender, LogSmsSender, SmsSender},
    },
    state::AppState,
    store::{MemoryStore, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.store_backend, env = ?config.app_env, "Configuration loaded");

    let sms: Arc<dyn SmsSender> = match &config.sms_gateway_url {
        Some(url) => Arc::new(HttpSmsSender::new(
            url.clone(),
            config.sms_gateway_secret.clone(),
        )?),
        None => Arc::new(LogSmsSender),
    };
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingDatabaseUrl)?;

            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            AppState::new(Arc::new(PgStore::new(pool)), &config, sms, hasher, clock)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), &config, sms, hasher, clock)
        }
    };

    if config.seed_sample_shops {
        seed_sample_shops(state.shops.as_ref(), &state.credentials).await?;
    }

    tokio::spawn(state.otp.clone().run_sweeper(
        std::time::Duration::from_secs(config.otp_sweep_interval_secs),
        chrono::Duration::seconds(i64::try_from(config.otp_sweep_grace_secs)?),
    ));

    let app = build_router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble public and authenticated routes around shared state.
fn build_router(state: AppState) -> Router {
    // Routes that need a shop session
    let authenticated_routes = Router::new()
        .route(
            "/api/shops/{shop_id}/inventory",
            put(handlers::shops::update_inventory).post(handlers::shops::add_product),
        )
        .route(
            "/api/shops/{shop_id}/inventory/{product_name}",
            delete(handlers::shops::delete_product),
        )
        .route(
            "/api/shops/{shop_id}/password",
            put(handlers::shops::change_password),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/test", get(handlers::health::ping))
        .route("/api/otp/send", post(handlers::otp::send_otp))
        .route("/api/otp/verify", post(handlers::otp::verify_otp))
        .route("/api/auth/user/login", post(handlers::auth::user_login))
        .route("/api/shops", get(handlers::shops::list_shops))
        .route("/api/shops/login", post(handlers::shops::shop_login))
        .merge(authenticated_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
