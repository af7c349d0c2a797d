//! Company, sale and purchase routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use mizan_db::repositories::{NewPurchase, NewSale};
use mizan_db::{CompanyRepository, DocumentRepository};
use mizan_shared::types::CompanyId;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::ActingUser};

/// Creates the company and document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", post(create_company))
        .route("/companies/{id}", get(get_company))
        .route("/purchases", post(create_purchase))
        .route("/purchases/{id}", get(get_purchase))
        .route("/purchases/{id}/approve", post(approve_purchase))
        .route("/purchases/{id}/cancel", post(cancel_purchase))
        .route("/sales", post(create_sale))
        .route("/sales/{id}", get(get_sale))
        .route("/sales/{id}/approve", post(approve_sale))
        .route("/sales/{id}/cancel", post(cancel_sale))
}

/// Request body for creating a company.
#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    /// Company name.
    pub name: String,
    /// Parent company, for a branch.
    pub parent_id: Option<CompanyId>,
}

fn documents(state: &AppState) -> DocumentRepository {
    DocumentRepository::new((*state.db).clone(), state.stock.clone())
}

/// POST `/companies`
async fn create_company(
    State(state): State<AppState>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let company = CompanyRepository::new((*state.db).clone())
        .create(&payload.name, payload.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET `/companies/{id}`
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(CompanyRepository::new((*state.db).clone()).get(id).await?))
}

/// POST `/purchases`
async fn create_purchase(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(payload): Json<NewPurchase>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = documents(&state).create_purchase(payload, user).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// GET `/purchases/{id}`
async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(documents(&state).get_purchase(id).await?))
}

/// POST `/purchases/{id}/approve`
async fn approve_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(documents(&state).approve_purchase(id).await?))
}

/// POST `/purchases/{id}/cancel`
async fn cancel_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(documents(&state).cancel_purchase(id).await?))
}

/// POST `/sales`
async fn create_sale(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(payload): Json<NewSale>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = documents(&state).create_sale(payload, user).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET `/sales/{id}`
async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(documents(&state).get_sale(id).await?))
}

/// POST `/sales/{id}/approve`
async fn approve_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(documents(&state).approve_sale(id).await?))
}

/// POST `/sales/{id}/cancel` - also cancels a linked purchase from the parent.
async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(documents(&state).cancel_sale(id).await?))
}
