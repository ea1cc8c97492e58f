//! Registration, login and the caller's own account
//!
//! POST /api/v1/auth/register   create an account (public)
//! POST /api/v1/auth/login      exchange credentials for a bearer token (public)
//! GET  /api/v1/profile         caller's own user
//! PUT  /api/v1/profile/password

use axum::http::StatusCode;
use axum::{Extension, extract::State};
use shared::error::ApiResponse;
use shared::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, UserCreate, UserResponse,
};

use super::extract::AppJson;
use super::{ApiCreated, ApiResult, validate};
use crate::auth::CurrentUser;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<UserCreate>,
) -> ApiCreated<UserResponse> {
    validate::user_create(&req)?;
    let user = state.users.register(req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("User registered", user),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let login = state.users.login(req).await?;
    Ok(ApiResponse::success_with_message("Login successful", login))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<UserResponse> {
    let profile = state.users.profile(user.id).await?;
    Ok(ApiResponse::success(profile))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    validate::change_password(&req)?;
    state.users.change_password(user.id, req).await?;
    Ok(ApiResponse::ok("Password updated"))
}
