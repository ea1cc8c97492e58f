//! Plan endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use shared::error::ApiResponse;
use shared::models::{Plan, PlanCreate, PlanListQuery, PlanUpdate};
use shared::pagination::PageQuery;

use super::extract::{AppJson, AppQuery};
use super::{ApiCreated, ApiResult, validate};
use crate::state::AppState;

/// GET /api/v1/plans?include_inactive=
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<PlanListQuery>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<Plan>> {
    let result = state
        .plans
        .list(filter.include_inactive(), page.resolve())
        .await?;
    Ok(ApiResponse::paginated("Plans retrieved", result.items, result.meta))
}

/// GET /api/v1/plans/active
pub async fn list_active(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
) -> ApiResult<Vec<Plan>> {
    let result = state.plans.list_active(page.resolve()).await?;
    Ok(ApiResponse::paginated(
        "Active plans retrieved",
        result.items,
        result.meta,
    ))
}

/// GET /api/v1/plans/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Plan> {
    let plan = state.plans.get(&id).await?;
    Ok(ApiResponse::success(plan))
}

/// POST /api/v1/plans
pub async fn create(
    State(state): State<AppState>,
    AppJson(req): AppJson<PlanCreate>,
) -> ApiCreated<Plan> {
    validate::plan_create(&req)?;
    let plan = state.plans.create(req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Plan created", plan),
    ))
}

/// PUT /api/v1/plans/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(req): AppJson<PlanUpdate>,
) -> ApiResult<Plan> {
    validate::plan_update(&req)?;
    let plan = state.plans.update(&id, req).await?;
    Ok(ApiResponse::success_with_message("Plan updated", plan))
}

/// DELETE /api/v1/plans/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.plans.delete(&id).await?;
    Ok(ApiResponse::ok("Plan deleted"))
}
