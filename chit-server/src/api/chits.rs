//! Chit endpoints and per-chit member management

use axum::extract::{Path, State};
use axum::http::StatusCode;
use shared::error::AppError;
use shared::models::{
    ChitCreate, ChitDetail, ChitMembers, ChitSchedule, ChitSummary, ChitUpdate, ExternalMember,
    ExternalMemberCreate, Membership, MembershipCreate,
};

use crate::auth::Principal;
use crate::db;
use crate::error::db_error;
use crate::state::AppState;

use super::{ApiResult, Json};

/// GET /api/chits/
pub async fn list_chits(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Vec<ChitSummary>> {
    let chits = db::chits::list_for_organizer(&state.pool, principal.user_id)
        .await
        .map_err(db_error)?;
    Ok(Json(chits))
}

/// POST /api/chits/
pub async fn create_chit(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ChitCreate>,
) -> Result<(StatusCode, Json<ChitDetail>), AppError> {
    let detail = db::chits::create(&state.pool, principal.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/chits/{id}/
pub async fn get_chit(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<ChitDetail> {
    Ok(Json(db::chits::detail(&state.pool, chit_id, principal.user_id).await?))
}

/// PUT /api/chits/{id}/
pub async fn update_chit(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Json(req): Json<ChitUpdate>,
) -> ApiResult<ChitDetail> {
    Ok(Json(db::chits::update(&state.pool, chit_id, principal.user_id, &req).await?))
}

/// DELETE /api/chits/{id}/
pub async fn delete_chit(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db::chits::delete(&state.pool, chit_id, principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/chits/{id}/add-member/
pub async fn add_member(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Json(req): Json<MembershipCreate>,
) -> Result<(StatusCode, Json<Membership>), AppError> {
    let membership =
        db::members::add_membership(&state.pool, chit_id, principal.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// POST /api/chits/{id}/add-external-member/
pub async fn add_external_member(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
    Json(req): Json<ExternalMemberCreate>,
) -> Result<(StatusCode, Json<ExternalMember>), AppError> {
    let member = db::members::add_external(&state.pool, chit_id, principal.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /api/chits/{id}/schedules/
pub async fn chit_schedules(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<Vec<ChitSchedule>> {
    db::chits::get_owned(&state.pool, chit_id, principal.user_id).await?;
    Ok(Json(db::schedules::list_for_chit(&state.pool, chit_id).await?))
}

/// GET /api/chits/{id}/members/
pub async fn chit_members(
    State(state): State<AppState>,
    principal: Principal,
    Path(chit_id): Path<i64>,
) -> ApiResult<ChitMembers> {
    db::chits::get_owned(&state.pool, chit_id, principal.user_id).await?;
    let verified_members = db::members::list_memberships(&state.pool, chit_id)
        .await
        .map_err(db_error)?;
    let external_members = db::members::list_external(&state.pool, chit_id)
        .await
        .map_err(db_error)?;

    Ok(Json(ChitMembers {
        total_count: verified_members.len() + external_members.len(),
        verified_members,
        external_members,
    }))
}
