//! Dashboard and report endpoints
//!
//! Each handler loads a ledger snapshot and hands it to the settlement engine.

use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use shared::error::AppError;
use shared::models::{
    BulkPaymentResult, BulkPaymentUpdate, ChitDashboard, CompletionReport, CurrentMonthView,
    Eligibility, MemberContribution, MemberHistory, MemberQuery, MemberRef, MonthQuery,
    MonthlyReport, MonthlyStatus, OrganizerDashboard, PaymentReminders,
};

use crate::auth::Principal;
use crate::db;
use crate::settlement::{self, ChitLedger};
use crate::state::AppState;

use super::{ApiResult, Json};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Snapshot plus the member named by the query, which must belong to the chit
async fn ledger_with_member(
    state: &AppState,
    principal: &Principal,
    chit_id: i64,
    query: &MemberQuery,
) -> Result<(ChitLedger, MemberRef), AppError> {
    let member = query.member()?;
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    if !ledger.contains_member(member) {
        return Err(db::members::member_not_found(member));
    }
    Ok((ledger, member))
}

/// GET /api/dashboard/organizer/
pub async fn organizer(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<OrganizerDashboard> {
    let ledgers = db::ledger::load_all_for_organizer(&state.pool, principal.user_id).await?;
    Ok(Json(settlement::organizer_overview(&ledgers, today())))
}

/// GET /api/dashboard/chit/{id}/
pub async fn chit(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<ChitDashboard> {
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(settlement::chit_dashboard(&ledger, today())))
}

/// GET /api/dashboard/chit/{id}/current-month/
pub async fn current_month(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<CurrentMonthView> {
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(settlement::current_month_view(&ledger, today())))
}

/// GET /api/dashboard/chit/{id}/member-history/?member_id=&member_type=
pub async fn member_history(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<MemberHistory> {
    let (ledger, member) = ledger_with_member(&state, &principal, chit_id, &query).await?;
    Ok(Json(settlement::member_history(&ledger, member)))
}

/// GET /api/dashboard/chit/{id}/member-contribution/?member_id=&member_type=
pub async fn member_contribution(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<MemberContribution> {
    let (ledger, member) = ledger_with_member(&state, &principal, chit_id, &query).await?;
    Ok(Json(settlement::member_contribution(&ledger, member)))
}

/// GET /api/dashboard/chit/{id}/check-eligibility/?member_id=&member_type=
pub async fn check_eligibility(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Eligibility> {
    let (ledger, member) = ledger_with_member(&state, &principal, chit_id, &query).await?;
    Ok(Json(settlement::check_eligibility(&ledger.schedules, member)))
}

/// GET /api/dashboard/chit/{id}/validate/
pub async fn validate(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<CompletionReport> {
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(settlement::validate_completion(&ledger)))
}

/// GET /api/dashboard/chit/{id}/monthly-report/
pub async fn monthly_report(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<MonthlyReport> {
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(settlement::monthly_report(&ledger)))
}

/// GET /api/dashboard/chit/{id}/monthly-status/?month_number=
pub async fn monthly_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<MonthlyStatus> {
    let month_number = query.required()?;
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(settlement::monthly_status(&ledger, month_number)?))
}

/// GET /api/dashboard/chit/{id}/payment-reminders/
pub async fn payment_reminders(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<PaymentReminders> {
    let ledger = db::ledger::load_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(settlement::payment_reminders(&ledger, today())))
}

/// POST /api/dashboard/chit/{id}/bulk-payment-update/
pub async fn bulk_payment_update(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Json(req): Json<BulkPaymentUpdate>,
) -> ApiResult<BulkPaymentResult> {
    let result =
        db::payments::bulk_update(&state.pool, chit_id, principal.user_id, &req.updates).await?;
    Ok(Json(result))
}
