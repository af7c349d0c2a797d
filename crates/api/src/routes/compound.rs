//! Compound transaction routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use mizan_core::compound::ExpenseInput;
use mizan_db::CompoundRepository;
use mizan_db::repositories::InterCompanySaleInput;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::ActingUser};

/// Creates the compound transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inter-company-sales", post(create_inter_company_sale))
        .route("/purchases/{id}/expenses", post(allocate_expenses))
}

/// Request body for allocating expenses to a purchase.
#[derive(Debug, Deserialize)]
pub struct AllocateExpensesRequest {
    /// Expenses in the order they should be stored.
    pub expenses: Vec<ExpenseInput>,
}

fn repository(state: &AppState) -> CompoundRepository {
    CompoundRepository::new((*state.db).clone(), state.settings.clone())
}

/// POST `/inter-company-sales`
async fn create_inter_company_sale(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(payload): Json<InterCompanySaleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repository(&state)
        .execute_inter_company_sale(payload, user)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST `/purchases/{id}/expenses`
///
/// Claim entries that fail after commit are listed under `ledger_failures`;
/// the expenses themselves are stored either way.
async fn allocate_expenses(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AllocateExpensesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let allocation = repository(&state)
        .allocate_purchase_expenses(id, payload.expenses, user)
        .await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}
