//! Data models
//!
//! Shared between the API service and its clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUID v4.

pub mod plan;
pub mod subscription;
pub mod user;

// Re-exports
pub use plan::*;
pub use subscription::*;
pub use user::*;
