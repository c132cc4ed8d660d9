//! HTTP API
//!
//! Handlers authenticate through the [`Principal`](crate::auth::Principal)
//! extractor, call into `db` and `settlement`, and return JSON. Every
//! resource is scoped to the calling organizer; foreign resources are 404.

pub mod auth;
pub mod chits;
pub mod dashboard;
pub mod external_members;
pub mod health;
mod json;
pub mod payments;
pub mod schedules;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue};
use shared::error::AppError;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{forgot_password_rate_limit, signin_rate_limit, signup_rate_limit};
use crate::config::Config;
use crate::state::AppState;

pub use json::Json;

pub type ApiResult<T> = Result<Json<T>, AppError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 request ids
#[derive(Clone, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, without middleware or state
pub fn build_router(state: &AppState) -> Router<AppState> {
    // Credential routes, rate limited per client IP
    let account = Router::new()
        .route(
            "/api/signup/",
            post(auth::signup)
                .route_layer(middleware::from_fn_with_state(state.clone(), signup_rate_limit)),
        )
        .route(
            "/api/signin/",
            post(auth::signin)
                .route_layer(middleware::from_fn_with_state(state.clone(), signin_rate_limit)),
        )
        .route(
            "/api/forgotpassword/",
            post(auth::forgot_password).route_layer(middleware::from_fn_with_state(
                state.clone(),
                forgot_password_rate_limit,
            )),
        )
        .route("/api/token/refresh/", post(auth::refresh_token))
        .route("/api/authcheck/", get(auth::auth_check));

    let chit_routes = Router::new()
        .route("/api/chits/", get(chits::list_chits).post(chits::create_chit))
        .route(
            "/api/chits/{id}/",
            get(chits::get_chit)
                .put(chits::update_chit)
                .delete(chits::delete_chit),
        )
        .route("/api/chits/{id}/add-member/", post(chits::add_member))
        .route("/api/chits/{id}/add-external-member/", post(chits::add_external_member))
        .route("/api/chits/{id}/schedules/", get(chits::chit_schedules))
        .route("/api/chits/{id}/members/", get(chits::chit_members));

    let schedule_routes = Router::new()
        .route("/api/schedules/", get(schedules::list_schedules))
        .route("/api/schedules/{id}/", get(schedules::get_schedule))
        .route("/api/schedules/{id}/update-month/", patch(schedules::update_month))
        .route("/api/schedules/{id}/assign-lifter/", post(schedules::assign_lifter))
        .route("/api/schedules/{id}/generate-payments/", post(schedules::generate_payments));

    let payment_routes = Router::new()
        .route("/api/payments/", get(payments::list_payments).post(payments::create_payment))
        .route("/api/payments/by-chit/", get(payments::by_chit))
        .route("/api/payments/by-month/", get(payments::by_month))
        .route("/api/payments/{id}/", get(payments::get_payment))
        .route("/api/payments/{id}/update-status/", patch(payments::update_status));

    let external_member_routes = Router::new()
        .route("/api/external-members/", get(external_members::list_external_members))
        .route(
            "/api/external-members/{id}/",
            get(external_members::get_external_member)
                .put(external_members::update_external_member)
                .delete(external_members::delete_external_member),
        );

    let dashboard_routes = Router::new()
        .route("/api/dashboard/organizer/", get(dashboard::organizer))
        .route("/api/dashboard/chit/{id}/", get(dashboard::chit))
        .route("/api/dashboard/chit/{id}/current-month/", get(dashboard::current_month))
        .route("/api/dashboard/chit/{id}/member-history/", get(dashboard::member_history))
        .route("/api/dashboard/chit/{id}/member-contribution/", get(dashboard::member_contribution))
        .route("/api/dashboard/chit/{id}/check-eligibility/", get(dashboard::check_eligibility))
        .route("/api/dashboard/chit/{id}/validate/", get(dashboard::validate))
        .route("/api/dashboard/chit/{id}/monthly-report/", get(dashboard::monthly_report))
        .route("/api/dashboard/chit/{id}/monthly-status/", get(dashboard::monthly_status))
        .route("/api/dashboard/chit/{id}/payment-reminders/", get(dashboard::payment_reminders))
        .route(
            "/api/dashboard/chit/{id}/bulk-payment-update/",
            post(dashboard::bulk_payment_update),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(account)
        .merge(chit_routes)
        .merge(schedule_routes)
        .merge(payment_routes)
        .merge(external_member_routes)
        .merge(dashboard_routes)
}

/// Fully configured application: routes, middleware and state
pub fn build_app(state: AppState, config: &Config) -> Router {
    build_router(&state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        // Propagate sits inside Set so it sees the generated id
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            UuidRequestId,
        ))
        .with_state(state)
}

/// Any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
