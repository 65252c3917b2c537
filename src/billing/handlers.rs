// HTTP handlers for billing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::billing::printer::{render_bill, PrintJob};
use crate::billing::service::{BillQuery, RevenuePeriod, RevenueReport};
use crate::billing::{Bill, BillRecord, BillingError, Promotion};

/// Handler for GET /api/schedules/{schedule_id}/bill
/// Computes the bill without persisting it
pub async fn get_bill_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<BillQuery>,
) -> Result<Json<Bill>, BillingError> {
    let bill = state.billing_service.get_bill(schedule_id, &query).await?;

    Ok(Json(bill))
}

/// Handler for POST /api/schedules/{schedule_id}/bill
/// Computes and persists the bill
pub async fn record_bill_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(query): Json<BillQuery>,
) -> Result<(StatusCode, Json<BillRecord>), BillingError> {
    let record = state.billing_service.record_bill(schedule_id, &query).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Handler for GET /api/schedules/{schedule_id}/bill/recorded
pub async fn get_recorded_bill_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<BillRecord>, BillingError> {
    let record = state
        .billing_service
        .find_recorded(schedule_id)
        .await?
        .ok_or(BillingError::BillNotFound)?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: String,
}

/// Handler for PUT /api/bills/{bill_id}/payment
pub async fn set_payment_method_handler(
    State(state): State<crate::AppState>,
    Path(bill_id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<BillRecord>, BillingError> {
    let record = state
        .billing_service
        .set_payment_method(bill_id, &request.payment_method)
        .await?;

    Ok(Json(record))
}

/// Handler for POST /api/schedules/{schedule_id}/bill/print
/// Renders the bill and queues it for the receipt printer
pub async fn print_bill_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(query): Json<BillQuery>,
) -> Result<(StatusCode, Json<Value>), BillingError> {
    let bill = state.billing_service.get_bill(schedule_id, &query).await?;

    state
        .print_queue
        .enqueue(PrintJob {
            label: format!("bill {} for schedule {}", bill.invoice_code, schedule_id),
            document: render_bill(&bill),
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "queued": true, "invoice_code": bill.invoice_code })),
    ))
}

/// Handler for GET /api/promotions
/// Lists the promotions currently offerable at checkout
pub async fn list_promotions_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<Promotion>>, BillingError> {
    let promotions = state.billing_service.list_active_promotions().await?;

    Ok(Json(promotions))
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub period: RevenuePeriod,
}

/// Handler for GET /api/revenue?period=day|week|month
pub async fn revenue_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, BillingError> {
    let report = state.billing_service.revenue(query.period).await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct RevenueRangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Handler for GET /api/revenue/range?from=...&to=...
pub async fn revenue_range_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<RevenueRangeQuery>,
) -> Result<Json<RevenueReport>, BillingError> {
    let report = state
        .billing_service
        .revenue_between(query.from, query.to)
        .await?;

    Ok(Json(report))
}

/// Handler for POST /api/bills/clean-duplicates
pub async fn clean_duplicate_bills_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Value>, BillingError> {
    let deleted = state.billing_service.clean_duplicate_bills().await?;

    Ok(Json(json!({ "deleted": deleted })))
}

/// Handler for POST /api/bills/clean-non-finished
pub async fn clean_non_finished_bills_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Value>, BillingError> {
    let deleted = state.billing_service.clean_non_finished_bills().await?;

    Ok(Json(json!({ "deleted": deleted })))
}
