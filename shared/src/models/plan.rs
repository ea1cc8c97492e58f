//! Subscription Plan Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plan entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// `true` = purchasable; `false` once soft-deleted
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Create plan payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCreate {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Update plan payload (only supplied fields are written)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub active: Option<bool>,
}

/// `?include_inactive=` flag for plan listing
///
/// Read leniently: `true`/`1` enable it, anything else means active only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanListQuery {
    #[serde(default)]
    pub include_inactive: Option<String>,
}

impl PlanListQuery {
    pub fn include_inactive(&self) -> bool {
        matches!(
            self.include_inactive.as_deref().map(str::trim),
            Some("true") | Some("1")
        )
    }
}
