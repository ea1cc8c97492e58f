//! Unified service-layer error type
//!
//! `ServiceError` bridges repository errors (`DbError`) and the API-layer
//! error (`AppError`), so services can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::{DbError, ONE_ACTIVE_PER_USER, USERS_EMAIL_KEY};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: infrastructure errors (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl ServiceError {
    /// Map `DbError::NotFound` to a resource-specific code
    pub fn or_not_found(code: ErrorCode) -> impl FnOnce(DbError) -> ServiceError {
        move |e| match e {
            DbError::NotFound => AppError::new(code).into(),
            other => other.into(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => ServiceError::App(AppError::new(ErrorCode::NotFound)),
            DbError::UniqueViolation(constraint) => {
                let code = match constraint.as_str() {
                    USERS_EMAIL_KEY => ErrorCode::EmailAlreadyRegistered,
                    ONE_ACTIVE_PER_USER => ErrorCode::AlreadySubscribed,
                    _ => ErrorCode::AlreadyExists,
                };
                ServiceError::App(AppError::new(code))
            }
            DbError::Sqlx(e) => ServiceError::Db(e.into()),
        }
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
