//! User endpoints
//!
//! Reads are public; updates and deletion need a bearer token.

use axum::extract::{Path, State};
use shared::error::ApiResponse;
use shared::models::{UserResponse, UserSearchQuery, UserUpdate};
use shared::pagination::PageQuery;

use super::extract::{AppJson, AppQuery};
use super::{ApiResult, validate};
use crate::state::AppState;

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<UserResponse>> {
    let result = state.users.list(page.resolve()).await?;
    Ok(ApiResponse::paginated("Users retrieved", result.items, result.meta))
}

/// GET /api/v1/users/search?q=
pub async fn search(
    State(state): State<AppState>,
    AppQuery(search): AppQuery<UserSearchQuery>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<UserResponse>> {
    let result = state
        .users
        .search(search.q.as_deref(), page.resolve())
        .await?;
    Ok(ApiResponse::paginated("Users retrieved", result.items, result.meta))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let user = state.users.get(&id).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UserUpdate>,
) -> ApiResult<UserResponse> {
    validate::user_update(&req)?;
    let user = state.users.update(&id, req).await?;
    Ok(ApiResponse::success_with_message("User updated", user))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.users.delete(&id).await?;
    Ok(ApiResponse::ok("User deleted"))
}
