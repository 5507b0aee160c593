//! Inspection Records Backend
//!
//! REST backend for inspection reports with SQLite persistence, year-scoped
//! report numbering, per-creator access scoping and Tantivy full-text search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod payload;
mod search;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Inspection Records Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
    };

    match auth::ensure_bootstrap_admin(&state).await? {
        Some(admin) => tracing::info!("Bootstrap admin account: {}", admin.username),
        None => tracing::warn!(
            "No admin token configured (INSPECT_ADMIN_TOKEN). Only existing account tokens can sign in."
        ),
    }

    // Build initial search index from database
    tracing::info!("Building search index...");
    let records = state.repo.list_all_records().await?;
    state.search.rebuild(&records).await?;
    tracing::info!("Search index built with {} records", records.len());

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        .route("/me", get(api::get_me))
        .route("/families", get(api::list_families))
        // Records
        .route(
            "/records/{family}",
            get(api::list_records).post(api::create_record),
        )
        .route(
            "/records/{family}/{id}",
            get(api::get_record)
                .put(api::update_record)
                .delete(api::delete_record),
        )
        // Search
        .route("/search", get(api::search_records))
        // Accounts
        .route("/accounts", get(api::list_accounts).post(api::create_account))
        // Services
        .route(
            "/services",
            get(api::list_services).post(api::create_service),
        )
        .route(
            "/services/{id}",
            get(api::get_service)
                .put(api::update_service)
                .delete(api::delete_service),
        )
        // Every /api route needs an authenticated caller
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_caller,
        ));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/verify/{token}", get(api::verify_report));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
