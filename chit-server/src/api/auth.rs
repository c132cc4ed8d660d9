//! Account endpoints: signup, signin, token refresh, password reset, auth check

use axum::{extract::State, http::StatusCode};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AuthCheckResponse, ForgotPasswordRequest, MessageResponse, SigninRequest, SigninResponse,
    SignupRequest, SignupResponse, TokenPair, TokenRefreshRequest,
};

use crate::auth::Principal;
use crate::db;
use crate::error::{db_error, unique_violation};
use crate::state::AppState;
use crate::util::{
    MAX_NAME_LEN, hash_password, validate_password, validate_required_text, verify_password,
};

use super::{ApiResult, Json};

fn hashing_failed(e: argon2::password_hash::Error) -> AppError {
    tracing::error!("Password hashing failed: {e}");
    AppError::new(ErrorCode::InternalError)
}

fn user_exists(phone_number: &str) -> AppError {
    AppError::new(ErrorCode::UserAlreadyExists).with_detail("phone_number", phone_number)
}

/// POST /api/signup/
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_password(&req.password, "password")?;

    let identity = state.identity.verify(&req.id_token).await?;
    let phone_number = identity.phone_number;

    if db::users::find_by_phone(&state.pool, &phone_number)
        .await
        .map_err(db_error)?
        .is_some()
    {
        return Err(user_exists(&phone_number));
    }

    let password_hash = hash_password(&req.password).map_err(hashing_failed)?;
    let created =
        db::users::create_verified(&state.pool, &phone_number, req.name.trim(), &password_hash)
            .await;
    let user = match created {
        Ok(user) => user,
        Err(e) if unique_violation(&e).is_some() => return Err(user_exists(&phone_number)),
        Err(e) => return Err(db_error(e)),
    };

    tracing::info!(user_id = user.id, uid = %identity.uid, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
            phone_number: user.phone_number,
            name: user.name,
        }),
    ))
}

/// POST /api/signin/
pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> ApiResult<SigninResponse> {
    let user = db::users::find_by_phone(&state.pool, req.phone_number.trim())
        .await
        .map_err(db_error)?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::invalid_credentials());
    }
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let access = issue_access(&state, user.id, &user.phone_number)?;
    let refresh = db::refresh_tokens::create(&state.pool, user.id, state.refresh_token_ttl_ms)
        .await
        .map_err(db_error)?;

    tracing::info!(user_id = user.id, "User signed in");

    Ok(Json(SigninResponse {
        access,
        refresh,
        user_id: user.id,
        name: user.name,
    }))
}

/// POST /api/token/refresh/
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRefreshRequest>,
) -> ApiResult<TokenPair> {
    let (user_id, refresh) =
        db::refresh_tokens::rotate(&state.pool, &req.refresh, state.refresh_token_ttl_ms)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::new(ErrorCode::SessionExpired))?;

    let user = db::users::find_by_id(&state.pool, user_id)
        .await
        .map_err(db_error)?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::SessionExpired))?;

    let access = issue_access(&state, user.id, &user.phone_number)?;
    Ok(Json(TokenPair { access, refresh }))
}

/// POST /api/forgotpassword/
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<MessageResponse> {
    validate_password(&req.new_password, "newPassword")?;

    let identity = state.identity.verify(&req.id_token).await?;
    if identity.phone_number != req.phone_number.trim() {
        return Err(AppError::new(ErrorCode::PhoneNumberMismatch)
            .with_detail("phoneNumber", req.phone_number.trim()));
    }

    let user = db::users::find_by_phone(&state.pool, &identity.phone_number)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let password_hash = hash_password(&req.new_password).map_err(hashing_failed)?;
    let revoked = db::users::reset_password(&state.pool, user.id, &password_hash)
        .await
        .map_err(db_error)?;

    tracing::info!(user_id = user.id, revoked_sessions = revoked, "Password reset");
    Ok(Json(MessageResponse::new("Password reset successful")))
}

/// GET /api/authcheck/
pub async fn auth_check(_principal: Principal) -> ApiResult<AuthCheckResponse> {
    Ok(Json(AuthCheckResponse { success: true }))
}

fn issue_access(state: &AppState, user_id: i64, phone_number: &str) -> Result<String, AppError> {
    state.sessions.issue(user_id, phone_number).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}
