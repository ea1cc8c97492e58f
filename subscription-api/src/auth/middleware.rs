//! Bearer-token middleware for protected routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use super::{CurrentUser, JwtService};
use crate::state::AppState;

/// Verify the bearer token and insert [`CurrentUser`] into request
/// extensions; rejects with 401 before the handler runs
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(uri = %request.uri(), "Missing Authorization header");
            AppError::not_authenticated()
        })?;

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Authorization header must be 'Bearer <token>'"))?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        AppError::from(e)
    })?;
    let user = CurrentUser::try_from(claims)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
