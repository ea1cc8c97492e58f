//! HTTP routes for the subscription API

pub mod auth;
pub mod extract;
pub mod health;
pub mod plans;
pub mod subscriptions;
pub mod users;
pub mod validate;

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{BoxError, Router, middleware};
use http::{HeaderName, HeaderValue};
use shared::error::{ApiResponse, AppError, ErrorCode};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::state::AppState;

pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// 201 Created with the envelope
pub type ApiCreated<T> = Result<(StatusCode, ApiResponse<T>), AppError>;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list))
        .route("/users/search", get(users::search))
        .route("/users/{id}", get(users::get_by_id))
        .route("/plans", get(plans::list))
        .route("/plans/active", get(plans::list_active))
        .route("/plans/{id}", get(plans::get_by_id))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(auth::profile))
        .route("/profile/password", put(auth::change_password))
        .route("/users/{id}", put(users::update).delete(users::delete))
        .route("/plans", post(plans::create))
        .route("/plans/{id}", put(plans::update).delete(plans::delete))
        .route(
            "/subscriptions",
            post(subscriptions::create).get(subscriptions::list),
        )
        .route("/subscriptions/details", get(subscriptions::list_with_details))
        .route("/subscriptions/user/{user_id}", get(subscriptions::list_by_user))
        .route(
            "/subscriptions/{id}",
            get(subscriptions::get_by_id)
                .put(subscriptions::update)
                .delete(subscriptions::cancel),
        )
        .route("/my-subscriptions", get(subscriptions::list_mine))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

async fn not_found() -> AppError {
    AppError::new(ErrorCode::NotFound)
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::new(ErrorCode::TimeoutError)
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        AppError::new(ErrorCode::InternalError)
    }
}

/// Request deadline, CORS, tracing and request ids around `router`
///
/// A request that outlives `request_timeout` is dropped and answered with a
/// `TimeoutError` envelope.
pub fn with_middleware(router: Router<AppState>, request_timeout: Duration) -> Router<AppState> {
    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(SetRequestIdLayer::new(REQUEST_ID, XRequestId))
}

/// Build the full application router
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let v1 = public_routes().merge(protected_routes(&state));

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", v1)
        .fallback(not_found);

    with_middleware(app, request_timeout).with_state(state)
}
