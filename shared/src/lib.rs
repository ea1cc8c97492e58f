//! Shared types for the subscription service
//!
//! Common types used by the API service and its clients: error codes and
//! the response envelope, pagination, and the domain models.

pub mod error;
pub mod models;
pub mod pagination;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use pagination::{Page, PageMeta, PageQuery};
