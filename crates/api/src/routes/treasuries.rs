//! Treasury routes: cash and bank accounts, movements and transfers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use mizan_core::treasury::NewTreasury;
use mizan_db::repositories::{TransferInput, TreasuryFilter, TreasuryMovement};
use mizan_db::TreasuryRepository;
use mizan_shared::types::{PageRequest, TreasuryId};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, extractors::ActingUser};

/// Creates the treasury routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/treasuries", post(create_treasury).get(list_treasuries))
        .route("/treasuries/{id}", get(get_treasury).patch(update_treasury))
        .route("/treasuries/{id}/deposits", post(deposit))
        .route("/treasuries/{id}/withdrawals", post(withdraw))
        .route("/treasuries/{id}/transactions", get(list_transactions))
        .route("/treasury-transfers", post(transfer))
}

/// Request body for activating or deactivating a treasury.
#[derive(Debug, Deserialize)]
pub struct UpdateTreasuryRequest {
    /// Whether movements are allowed.
    pub is_active: bool,
}

fn repository(state: &AppState) -> TreasuryRepository {
    TreasuryRepository::new((*state.db).clone(), state.settings.clone())
}

/// POST `/treasuries`
async fn create_treasury(
    State(state): State<AppState>,
    Json(payload): Json<NewTreasury>,
) -> Result<impl IntoResponse, ApiError> {
    let treasury = repository(&state).create(payload).await?;
    Ok((StatusCode::CREATED, Json(treasury)))
}

/// GET `/treasuries`
async fn list_treasuries(
    State(state): State<AppState>,
    Query(filter): Query<TreasuryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let treasuries = repository(&state).list(filter).await?;
    Ok(Json(json!({ "treasuries": treasuries })))
}

/// GET `/treasuries/{id}`
async fn get_treasury(
    State(state): State<AppState>,
    Path(id): Path<TreasuryId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repository(&state).get(id).await?))
}

/// PATCH `/treasuries/{id}`
async fn update_treasury(
    State(state): State<AppState>,
    Path(id): Path<TreasuryId>,
    Json(payload): Json<UpdateTreasuryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let treasury = repository(&state).set_active(id, payload.is_active).await?;
    Ok(Json(treasury))
}

/// POST `/treasuries/{id}/deposits`
async fn deposit(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<TreasuryId>,
    Json(payload): Json<TreasuryMovement>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repository(&state).deposit(id, payload, user).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// POST `/treasuries/{id}/withdrawals`
async fn withdraw(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<TreasuryId>,
    Json(payload): Json<TreasuryMovement>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = repository(&state).withdraw(id, payload, user).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET `/treasuries/{id}/transactions` - newest first, `?page=&per_page=`.
async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<TreasuryId>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = repository(&state).transactions_page(id, &page).await?;
    Ok(Json(entries))
}

/// POST `/treasury-transfers`
async fn transfer(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(payload): Json<TransferInput>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repository(&state).transfer(payload, user).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
