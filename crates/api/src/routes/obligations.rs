//! Payment obligation and installment routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use mizan_core::obligation::{NewInstallment, NewObligation};
use mizan_db::ObligationRepository;
use mizan_db::repositories::{ObligationFilter, PayInFull};
use mizan_shared::types::{InstallmentId, ObligationId};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, extractors::ActingUser};

/// Creates the obligation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/obligations", post(create_obligation).get(list_obligations))
        .route("/obligations/{id}", get(get_obligation))
        .route(
            "/obligations/{id}/installments",
            post(add_installment).get(list_installments),
        )
        .route("/obligations/{id}/pay-in-full", post(pay_in_full))
        .route("/obligations/{id}/cancel", post(cancel_obligation))
        .route("/installments/{id}", delete(delete_installment))
}

/// Request body for cancelling an obligation.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// Why the obligation is cancelled.
    pub reason: String,
}

fn repository(state: &AppState) -> ObligationRepository {
    ObligationRepository::new((*state.db).clone(), state.settings.clone())
}

/// POST `/obligations`
async fn create_obligation(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(payload): Json<NewObligation>,
) -> Result<impl IntoResponse, ApiError> {
    let obligation = repository(&state).create(payload, user).await?;
    Ok((StatusCode::CREATED, Json(obligation)))
}

/// GET `/obligations` - newest first.
async fn list_obligations(
    State(state): State<AppState>,
    Query(filter): Query<ObligationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let obligations = repository(&state).list(filter).await?;
    Ok(Json(json!({ "obligations": obligations })))
}

/// GET `/obligations/{id}` - with installments, paid and remaining.
async fn get_obligation(
    State(state): State<AppState>,
    Path(id): Path<ObligationId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(repository(&state).get(id).await?))
}

/// POST `/obligations/{id}/installments`
async fn add_installment(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<ObligationId>,
    Json(payload): Json<NewInstallment>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = repository(&state).add_installment(id, payload, user).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET `/obligations/{id}/installments`
async fn list_installments(
    State(state): State<AppState>,
    Path(id): Path<ObligationId>,
) -> Result<impl IntoResponse, ApiError> {
    let installments = repository(&state).list_installments(id).await?;
    Ok(Json(json!({ "installments": installments })))
}

/// POST `/obligations/{id}/pay-in-full`
async fn pay_in_full(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<ObligationId>,
    Json(payload): Json<PayInFull>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = repository(&state).pay_in_full(id, payload, user).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST `/obligations/{id}/cancel`
async fn cancel_obligation(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<ObligationId>,
    Json(payload): Json<CancelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let obligation = repository(&state)
        .cancel(id, &payload.reason, user)
        .await?;
    Ok(Json(obligation))
}

/// DELETE `/installments/{id}` - returns the obligation afterwards.
async fn delete_installment(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(id): Path<InstallmentId>,
) -> Result<impl IntoResponse, ApiError> {
    let obligation = repository(&state).delete_installment(id, user).await?;
    Ok(Json(obligation))
}
