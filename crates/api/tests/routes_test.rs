//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use mizan_api::{AppState, create_router};
use mizan_db::migration::{Migrator, MigratorTrait};
use mizan_db::{LedgerSettings, StockMovementJournal};
use mizan_shared::LedgerConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn test_app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let settings = LedgerSettings::from_config(&LedgerConfig::default()).unwrap();
    create_router(AppState::new(db, settings, Arc::new(StockMovementJournal)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    user: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), None).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

async fn funded_treasury(app: &Router, opening: &str) -> String {
    let (status, treasury) = post(
        app,
        "/api/v1/treasuries",
        json!({ "name": "Main cash box", "kind": "GENERAL" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = id_of(&treasury);

    let (status, _) = post(
        app,
        &format!("/api/v1/treasuries/{id}/deposits"),
        json!({
            "amount": opening,
            "reference": { "kind": "DEPOSIT", "id": Uuid::now_v7() },
            "description": "Opening balance"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id
}

async fn supplier(app: &Router) -> String {
    let (status, party) = post(
        app,
        "/api/v1/parties",
        json!({ "kind": "SUPPLIER", "name": "Misrata Steel" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id_of(&party)
}

async fn company(app: &Router, name: &str, parent_id: Option<&str>) -> String {
    let (status, company) = post(
        app,
        "/api/v1/companies",
        json!({ "name": name, "parent_id": parent_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id_of(&company)
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_treasury_movements() {
    let app = test_app().await;
    let treasury = funded_treasury(&app, "1000").await;
    let user = Uuid::now_v7().to_string();

    let (status, entry) = send(
        &app,
        Method::POST,
        &format!("/api/v1/treasuries/{treasury}/withdrawals"),
        Some(json!({
            "amount": "300",
            "reference": { "kind": "PAYMENT", "id": Uuid::now_v7() },
        })),
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["direction"], "DEBIT");
    assert_eq!(decimal(&entry["balance_before"]), dec!(1000));
    assert_eq!(decimal(&entry["balance_after"]), dec!(700));
    assert_eq!(entry["created_by"], user.as_str());

    let (status, body) = get(&app, &format!("/api/v1/treasuries/{treasury}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["current_balance"]), dec!(700));

    let (_, body) = get(&app, &format!("/api/v1/treasuries/{treasury}/transactions")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 2);

    let (_, body) = get(
        &app,
        &format!("/api/v1/treasuries/{treasury}/transactions?page=2&per_page=1"),
    )
    .await;
    let page = body["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["direction"], "CREDIT");
    assert_eq!(body["meta"]["total_pages"], 2);
}

#[tokio::test]
async fn test_overdraft_maps_to_422() {
    let app = test_app().await;
    let treasury = funded_treasury(&app, "100").await;

    let (status, body) = post(
        &app,
        &format!("/api/v1/treasuries/{treasury}/withdrawals"),
        json!({
            "amount": "150",
            "reference": { "kind": "PAYMENT", "id": Uuid::now_v7() },
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "INSUFFICIENT_FUNDS");
    assert!(body["message"].as_str().unwrap().contains("Insufficient funds"));
}

#[tokio::test]
async fn test_unknown_treasury_is_404() {
    let app = test_app().await;
    let (status, body) = get(&app, &format!("/api/v1/treasuries/{}", Uuid::now_v7())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_user_header_is_rejected() {
    let app = test_app().await;
    let treasury = funded_treasury(&app, "100").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/treasuries/{treasury}/deposits"),
        Some(json!({
            "amount": "10",
            "reference": { "kind": "DEPOSIT", "id": Uuid::now_v7() },
        })),
        Some("not-a-uuid"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_USER_ID");
}

#[tokio::test]
async fn test_transfer_between_treasuries() {
    let app = test_app().await;
    let from = funded_treasury(&app, "500").await;
    let to = funded_treasury(&app, "1").await;

    let (status, body) = post(
        &app,
        "/api/v1/treasury-transfers",
        json!({ "from_treasury_id": from, "to_treasury_id": to, "amount": "200" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outgoing"]["reference"]["kind"], "TRANSFER");
    assert_eq!(
        body["outgoing"]["reference"]["id"],
        body["incoming"]["reference"]["id"]
    );

    let (status, body) = post(
        &app,
        "/api/v1/treasury-transfers",
        json!({ "from_treasury_id": from, "to_treasury_id": from, "amount": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "SAME_ACCOUNT");
}

#[tokio::test]
async fn test_obligation_installments_and_party_summary() {
    let app = test_app().await;
    let treasury = funded_treasury(&app, "1000").await;
    let party = supplier(&app).await;

    let (status, obligation) = post(
        &app,
        "/api/v1/obligations",
        json!({
            "party_id": party,
            "amount": "1000",
            "currency": "LYD",
            "origin": { "kind": "PURCHASE", "id": Uuid::now_v7() },
            "record_claim": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(obligation["status"], "PENDING");
    let obligation = id_of(&obligation);

    let (status, receipt) = post(
        &app,
        &format!("/api/v1/obligations/{obligation}/installments"),
        json!({ "amount": "400", "treasury_id": treasury }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&receipt["remaining"]), dec!(600));
    assert_eq!(decimal(&receipt["treasury_entry"]["balance_after"]), dec!(600));

    let (status, body) = post(
        &app,
        &format!("/api/v1/obligations/{obligation}/installments"),
        json!({ "amount": "700" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "OVERPAYMENT");

    let (_, view) = get(&app, &format!("/api/v1/obligations/{obligation}")).await;
    assert_eq!(decimal(&view["paid"]), dec!(400));
    assert_eq!(view["installments"].as_array().unwrap().len(), 1);

    let (_, summary) = get(&app, &format!("/api/v1/parties/{party}/summary")).await;
    assert_eq!(summary["has_outstanding_debt"], true);
    assert_eq!(decimal(&summary["balances"]["LYD"]), dec!(600));

    let (_, statement) = get(&app, &format!("/api/v1/parties/{party}/statement")).await;
    assert_eq!(statement["entries"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&statement["totals"]["LYD"]["net"]), dec!(600));

    let (_, list) = get(&app, "/api/v1/obligations?status=PENDING").await;
    assert_eq!(list["obligations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pay_in_full_then_delete_installment() {
    let app = test_app().await;
    let treasury = funded_treasury(&app, "1000").await;
    let party = supplier(&app).await;

    let (_, obligation) = post(
        &app,
        "/api/v1/obligations",
        json!({
            "party_id": party,
            "amount": "250",
            "currency": "LYD",
            "origin": { "kind": "PURCHASE", "id": Uuid::now_v7() },
            "record_claim": true
        }),
    )
    .await;
    let obligation = id_of(&obligation);

    let (status, receipt) = post(
        &app,
        &format!("/api/v1/obligations/{obligation}/pay-in-full"),
        json!({ "treasury_id": treasury }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["obligation"]["status"], "PAID");
    let installment = receipt["installment"]["id"].as_str().unwrap().to_string();

    let (status, obligation_after) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/installments/{installment}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(obligation_after["status"], "PENDING");

    let (_, list) = get(&app, &format!("/api/v1/obligations/{obligation}/installments")).await;
    assert!(list["installments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_obligation() {
    let app = test_app().await;
    let party = supplier(&app).await;

    let (_, obligation) = post(
        &app,
        "/api/v1/obligations",
        json!({
            "party_id": party,
            "amount": "300",
            "currency": "LYD",
            "origin": { "kind": "PURCHASE", "id": Uuid::now_v7() },
            "record_claim": true
        }),
    )
    .await;
    let obligation = id_of(&obligation);

    let (status, cancelled) = post(
        &app,
        &format!("/api/v1/obligations/{obligation}/cancel"),
        json!({ "reason": "Goods never shipped" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["cancel_reason"], "Goods never shipped");

    let (_, summary) = get(&app, &format!("/api/v1/parties/{party}/summary")).await;
    assert_eq!(summary["has_outstanding_debt"], false);

    let (status, body) = post(
        &app,
        &format!("/api/v1/obligations/{obligation}/installments"),
        json!({ "amount": "10" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_STATE");
}

#[tokio::test]
async fn test_inter_company_sale() {
    let app = test_app().await;
    let parent = company(&app, "Head office", None).await;
    let branch = company(&app, "Benghazi branch", Some(&parent)).await;
    let product = Uuid::now_v7();

    let (status, result) = post(
        &app,
        "/api/v1/inter-company-sales",
        json!({
            "branch_company_id": branch,
            "parent_company_id": parent,
            "lines": [{
                "product_id": product,
                "quantity": 3,
                "parent_unit_price": "30",
                "branch_unit_price": "40"
            }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&result["branch_total"]), dec!(120));
    assert_eq!(decimal(&result["parent_total"]), dec!(90));
    assert_eq!(decimal(&result["margin"]), dec!(30));
    assert_eq!(result["purchase"]["purchase"]["payment_mode"], "CREDIT");
    assert_eq!(result["sale"]["sale"]["status"], "DRAFT");

    let sale = result["sale"]["sale"]["id"].as_str().unwrap().to_string();
    let (status, cancelled) = post(&app, &format!("/api/v1/sales/{sale}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
}

#[tokio::test]
async fn test_inter_company_sale_requires_branch_of_parent() {
    let app = test_app().await;
    let parent = company(&app, "Head office", None).await;
    let stranger = company(&app, "Unrelated", None).await;

    let (status, body) = post(
        &app,
        "/api/v1/inter-company-sales",
        json!({
            "branch_company_id": stranger,
            "parent_company_id": parent,
            "lines": [{
                "product_id": Uuid::now_v7(),
                "quantity": 1,
                "parent_unit_price": "5",
                "branch_unit_price": "6"
            }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "MISMATCHED_RELATIONSHIP");
}

#[tokio::test]
async fn test_expense_allocation_on_approved_purchase() {
    let app = test_app().await;
    let buyer = company(&app, "Head office", None).await;
    let freight = supplier(&app).await;

    let (status, purchase) = post(
        &app,
        "/api/v1/purchases",
        json!({
            "company_id": buyer,
            "lines": [{ "product_id": Uuid::now_v7(), "quantity": 10, "unit_price": "100" }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let purchase = purchase["purchase"]["id"].as_str().unwrap().to_string();

    let expenses = json!({
        "expenses": [
            {
                "description": "Freight",
                "amount": "150",
                "currency": "LYD",
                "is_actual_expense": true,
                "supplier_id": freight
            },
            {
                "description": "Customs estimate",
                "amount": "50",
                "currency": "LYD",
                "is_actual_expense": false
            }
        ]
    });

    let (status, body) = post(
        &app,
        &format!("/api/v1/purchases/{purchase}/expenses"),
        expenses.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_STATE");

    let (status, approved) =
        post(&app, &format!("/api/v1/purchases/{purchase}/approve"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");

    let (status, allocation) =
        post(&app, &format!("/api/v1/purchases/{purchase}/expenses"), expenses).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&allocation["purchase"]["total_expenses"]), dec!(200));
    assert_eq!(decimal(&allocation["purchase"]["final_total"]), dec!(1200));
    assert_eq!(allocation["obligations"].as_array().unwrap().len(), 1);
    assert_eq!(allocation["claim_entries"].as_array().unwrap().len(), 1);
    assert!(allocation["ledger_failures"].as_array().unwrap().is_empty());

    let (_, summary) = get(&app, &format!("/api/v1/parties/{freight}/summary")).await;
    assert_eq!(decimal(&summary["balances"]["LYD"]), dec!(150));
}
