//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes over the settlement repositories
//! - The acting-user extractor
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use mizan_db::{LedgerSettings, StockGateway};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Resolved ledger settings.
    pub settings: LedgerSettings,
    /// Receives stock deltas when documents are approved.
    pub stock: Arc<dyn StockGateway>,
}

impl AppState {
    /// Creates the state from a connection and settings.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        settings: LedgerSettings,
        stock: Arc<dyn StockGateway>,
    ) -> Self {
        Self {
            db: Arc::new(db),
            settings,
            stock,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
