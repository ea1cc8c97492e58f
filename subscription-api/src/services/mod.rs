//! Domain services
//!
//! Stateless apart from their repository handles. Only the subscription
//! service reads the other entities' repositories; the plan service reads
//! subscriptions for its deletion guard.

pub mod plan;
pub mod subscription;
pub mod user;

use shared::error::AppError;
use shared::pagination::PageMeta;
use uuid::Uuid;

use crate::error::ServiceResult;

pub use plan::PlanService;
pub use subscription::SubscriptionService;
pub use user::UserService;

/// One page of results plus its metadata
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Parse a path/body identifier, reporting which resource it was for
pub(crate) fn parse_id(raw: &str, resource: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::invalid_id(resource).into())
}
