//! Schedule endpoints: listing, month edits, lifter assignment, payment generation

use axum::extract::{Path, Query, State};
use shared::models::{
    AssignLifterRequest, ChitSchedule, Payment, ScheduleFilter, ScheduleMonthUpdate,
};

use crate::auth::Principal;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, Json};

/// GET /api/schedules/?chit_id=
pub async fn list_schedules(
    State(state): State<AppState>,
    principal: Principal,
    Query(filter): Query<ScheduleFilter>,
) -> ApiResult<Vec<ChitSchedule>> {
    let schedules =
        db::schedules::list_for_organizer(&state.pool, principal.user_id, filter.chit_id).await?;
    Ok(Json(schedules))
}

/// GET /api/schedules/{id}/
pub async fn get_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<i64>,
) -> ApiResult<ChitSchedule> {
    Ok(Json(db::schedules::get_owned(&state.pool, schedule_id, principal.user_id).await?))
}

/// PATCH /api/schedules/{id}/update-month/
pub async fn update_month(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<i64>,
    Json(req): Json<ScheduleMonthUpdate>,
) -> ApiResult<ChitSchedule> {
    let schedule =
        db::schedules::update_month(&state.pool, schedule_id, principal.user_id, &req).await?;
    Ok(Json(schedule))
}

/// POST /api/schedules/{id}/assign-lifter/
pub async fn assign_lifter(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<i64>,
    Json(req): Json<AssignLifterRequest>,
) -> ApiResult<ChitSchedule> {
    let schedule =
        db::schedules::assign_lifter(&state.pool, schedule_id, principal.user_id, req.into())
            .await?;
    Ok(Json(schedule))
}

/// POST /api/schedules/{id}/generate-payments/
pub async fn generate_payments(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<i64>,
) -> ApiResult<Vec<Payment>> {
    let created =
        db::payments::generate_for_schedule(&state.pool, schedule_id, principal.user_id).await?;
    Ok(Json(created))
}
