//! Party routes: registry, balances and statements.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use mizan_core::ledger::PartyKind;
use mizan_db::PartyRepository;
use mizan_shared::types::PartyId;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Creates the party routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/parties", post(create_party))
        .route("/parties/{id}", get(get_party))
        .route("/parties/{id}/summary", get(get_summary))
        .route("/parties/{id}/statement", get(get_statement))
}

/// Request body for registering a party.
#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    /// Supplier, customer or employee.
    pub kind: PartyKind,
    /// Display name.
    pub name: String,
}

/// POST `/parties`
async fn create_party(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let party = PartyRepository::new((*state.db).clone())
        .create(payload.kind, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(party)))
}

/// GET `/parties/{id}`
async fn get_party(
    State(state): State<AppState>,
    Path(id): Path<PartyId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(PartyRepository::new((*state.db).clone()).get(id).await?))
}

/// GET `/parties/{id}/summary` - balances per currency.
async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<PartyId>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = PartyRepository::new((*state.db).clone())
        .account_summary(id)
        .await?;
    Ok(Json(summary))
}

/// GET `/parties/{id}/statement`
async fn get_statement(
    State(state): State<AppState>,
    Path(id): Path<PartyId>,
) -> Result<impl IntoResponse, ApiError> {
    let statement = PartyRepository::new((*state.db).clone())
        .statement(id)
        .await?;
    Ok(Json(statement))
}
