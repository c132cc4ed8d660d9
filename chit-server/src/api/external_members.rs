//! External member endpoints (creation goes through the chit)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use shared::error::AppError;
use shared::models::{ExternalMember, ExternalMemberUpdate};

use crate::auth::Principal;
use crate::db;
use crate::error::db_error;
use crate::state::AppState;

use super::{ApiResult, Json};

/// GET /api/external-members/
pub async fn list_external_members(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Vec<ExternalMember>> {
    let members = db::members::list_external_for_organizer(&state.pool, principal.user_id)
        .await
        .map_err(db_error)?;
    Ok(Json(members))
}

/// GET /api/external-members/{id}/
pub async fn get_external_member(
    State(state): State<AppState>,
    principal: Principal,
    Path(member_id): Path<i64>,
) -> ApiResult<ExternalMember> {
    Ok(Json(db::members::get_external_owned(&state.pool, member_id, principal.user_id).await?))
}

/// PUT /api/external-members/{id}/
pub async fn update_external_member(
    State(state): State<AppState>,
    principal: Principal,
    Path(member_id): Path<i64>,
    Json(req): Json<ExternalMemberUpdate>,
) -> ApiResult<ExternalMember> {
    let member =
        db::members::update_external(&state.pool, member_id, principal.user_id, &req).await?;
    Ok(Json(member))
}

/// DELETE /api/external-members/{id}/
pub async fn delete_external_member(
    State(state): State<AppState>,
    principal: Principal,
    Path(member_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db::members::delete_external(&state.pool, member_id, principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
