//! Subscription endpoints (all behind the bearer-token gate)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use shared::error::ApiResponse;
use shared::models::{SubscriptionCreate, SubscriptionResponse, SubscriptionUpdate};
use shared::pagination::PageQuery;

use super::extract::{AppJson, AppQuery};
use super::{ApiCreated, ApiResult};
use crate::auth::CurrentUser;
use crate::state::AppState;

/// POST /api/v1/subscriptions
pub async fn create(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubscriptionCreate>,
) -> ApiCreated<SubscriptionResponse> {
    let subscription = state.subscriptions.create(req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Subscription created", subscription),
    ))
}

/// GET /api/v1/subscriptions
pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let result = state.subscriptions.list(page.resolve()).await?;
    Ok(ApiResponse::paginated(
        "Subscriptions retrieved",
        result.items,
        result.meta,
    ))
}

/// GET /api/v1/subscriptions/details
pub async fn list_with_details(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let result = state.subscriptions.list_with_details(page.resolve()).await?;
    Ok(ApiResponse::paginated(
        "Subscriptions retrieved",
        result.items,
        result.meta,
    ))
}

/// GET /api/v1/subscriptions/user/{user_id}
pub async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let result = state
        .subscriptions
        .list_by_user(&user_id, page.resolve())
        .await?;
    Ok(ApiResponse::paginated(
        "Subscriptions retrieved",
        result.items,
        result.meta,
    ))
}

/// GET /api/v1/my-subscriptions
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let result = state
        .subscriptions
        .list_mine(user.id, page.resolve())
        .await?;
    Ok(ApiResponse::paginated(
        "Subscriptions retrieved",
        result.items,
        result.meta,
    ))
}

/// GET /api/v1/subscriptions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SubscriptionResponse> {
    let subscription = state.subscriptions.get(&id).await?;
    Ok(ApiResponse::success(subscription))
}

/// PUT /api/v1/subscriptions/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<SubscriptionUpdate>,
) -> ApiResult<SubscriptionResponse> {
    let subscription = state.subscriptions.update(&id, req).await?;
    Ok(ApiResponse::success_with_message(
        "Subscription updated",
        subscription,
    ))
}

/// DELETE /api/v1/subscriptions/{id} (cancels; the record is kept)
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SubscriptionResponse> {
    let subscription = state.subscriptions.cancel(&id).await?;
    Ok(ApiResponse::success_with_message(
        "Subscription cancelled",
        subscription,
    ))
}
