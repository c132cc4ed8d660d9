//! Payment endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use shared::error::AppError;
use shared::models::{Payment, PaymentCreate, PaymentFilter, PaymentStatusUpdate};

use crate::auth::Principal;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, Json};

/// GET /api/payments/?chit_id=&month_number=
pub async fn list_payments(
    State(state): State<AppState>,
    principal: Principal,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<Vec<Payment>> {
    Ok(Json(db::payments::list_for_organizer(&state.pool, principal.user_id, &filter).await?))
}

/// POST /api/payments/
pub async fn create_payment(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<PaymentCreate>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = db::payments::create(&state.pool, principal.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments/{id}/
pub async fn get_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<i64>,
) -> ApiResult<Payment> {
    Ok(Json(db::payments::get_owned(&state.pool, payment_id, principal.user_id).await?))
}

/// PATCH /api/payments/{id}/update-status/
pub async fn update_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(payment_id): Path<i64>,
    Json(req): Json<PaymentStatusUpdate>,
) -> ApiResult<Payment> {
    let payment =
        db::payments::update_status(&state.pool, payment_id, principal.user_id, req.status)
            .await?;
    Ok(Json(payment))
}

/// GET /api/payments/by-chit/?chit_id=
pub async fn by_chit(
    State(state): State<AppState>,
    principal: Principal,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<Vec<Payment>> {
    let chit_id = required_chit(&filter)?;
    Ok(Json(
        db::payments::list_for_owned_chit(&state.pool, chit_id, principal.user_id, None).await?,
    ))
}

/// GET /api/payments/by-month/?chit_id=&month_number=
pub async fn by_month(
    State(state): State<AppState>,
    principal: Principal,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<Vec<Payment>> {
    let chit_id = required_chit(&filter)?;
    let month_number = filter
        .month_number
        .ok_or_else(|| AppError::field("month_number", "This query parameter is required."))?;
    let payments = db::payments::list_for_owned_chit(
        &state.pool,
        chit_id,
        principal.user_id,
        Some(month_number),
    )
    .await?;
    Ok(Json(payments))
}

fn required_chit(filter: &PaymentFilter) -> Result<i64, AppError> {
    filter
        .chit_id
        .ok_or_else(|| AppError::field("chit_id", "This query parameter is required."))
}
