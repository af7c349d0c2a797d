//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod compound;
pub mod documents;
pub mod health;
pub mod obligations;
pub mod parties;
pub mod treasuries;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(treasuries::routes())
        .merge(obligations::routes())
        .merge(parties::routes())
        .merge(documents::routes())
        .merge(compound::routes())
}
