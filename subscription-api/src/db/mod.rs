//! Database access layer
//!
//! Repository traits with a PostgreSQL implementation (hand-written SQL over
//! sqlx) and an in-memory implementation backed by DashMap.

pub mod memory;
pub mod plans;
pub mod subscriptions;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{Plan, Subscription, SubscriptionState, User};
use thiserror::Error;
use uuid::Uuid;

pub use memory::{MemoryPlanRepository, MemorySubscriptionRepository, MemoryUserRepository};
pub use plans::PgPlanRepository;
pub use subscriptions::PgSubscriptionRepository;
pub use users::PgUserRepository;

/// Unique index on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";
/// Partial unique index on `subscriptions(user_id) WHERE state = 'active'`
pub const ONE_ACTIVE_PER_USER: &str = "subscriptions_one_active_per_user";

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated (carries the constraint name)
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::UniqueViolation(db.constraint().unwrap_or_default().to_string())
            }
            _ => DbError::Sqlx(e),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

// ========== Users ==========

/// Create user input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Partial user update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.password_hash.is_none()
    }
}

/// User listing filter
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self.search.as_deref() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                user.name.to_lowercase().contains(&term)
                    || user.email.to_lowercase().contains(&term)
            }
        }
    }
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a taken email yields `UniqueViolation(USERS_EMAIL_KEY)`
    async fn create(&self, user: NewUser) -> DbResult<User>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<User>>;

    /// Exact match on the normalized email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// Newest first
    async fn list(&self, filter: &UserFilter, limit: i64, offset: i64) -> DbResult<Vec<User>>;

    async fn count(&self, filter: &UserFilter) -> DbResult<i64>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> DbResult<User>;

    /// Set `active = false`
    async fn soft_delete(&self, id: Uuid) -> DbResult<()>;
}

// ========== Plans ==========

/// Create plan input
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

/// Partial plan update
#[derive(Debug, Clone, Default)]
pub struct PlanChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub active: Option<bool>,
}

impl PlanChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.active.is_none()
    }
}

/// Plan listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanFilter {
    pub include_inactive: bool,
}

impl PlanFilter {
    pub fn matches(&self, plan: &Plan) -> bool {
        self.include_inactive || plan.active
    }
}

/// Plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn create(&self, plan: NewPlan) -> DbResult<Plan>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Plan>>;

    /// Cheapest first
    async fn list(&self, filter: &PlanFilter, limit: i64, offset: i64) -> DbResult<Vec<Plan>>;

    async fn count(&self, filter: &PlanFilter) -> DbResult<i64>;

    async fn update(&self, id: Uuid, changes: PlanChanges) -> DbResult<Plan>;

    /// Set `active = false`
    async fn soft_delete(&self, id: Uuid) -> DbResult<()>;
}

// ========== Subscriptions ==========

/// Create subscription input (always stored `active`)
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Partial subscription update
#[derive(Debug, Clone, Default)]
pub struct SubscriptionChanges {
    pub end_date: Option<DateTime<Utc>>,
    pub state: Option<SubscriptionState>,
}

impl SubscriptionChanges {
    pub fn is_empty(&self) -> bool {
        self.end_date.is_none() && self.state.is_none()
    }
}

/// Subscription listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
}

impl SubscriptionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn matches(&self, subscription: &Subscription) -> bool {
        self.user_id.is_none_or(|id| subscription.user_id == id)
    }
}

/// Subscription joined with the user and plan it references
#[derive(Debug, Clone)]
pub struct SubscriptionDetail {
    pub subscription: Subscription,
    pub user: User,
    pub plan: Plan,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert an `active` subscription; a second active one for the same
    /// user yields `UniqueViolation(ONE_ACTIVE_PER_USER)`
    async fn create(&self, subscription: NewSubscription) -> DbResult<Subscription>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Subscription>>;

    /// Newest first
    async fn list(
        &self,
        filter: &SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Subscription>>;

    async fn count(&self, filter: &SubscriptionFilter) -> DbResult<i64>;

    async fn update(&self, id: Uuid, changes: SubscriptionChanges) -> DbResult<Subscription>;

    /// The user's stored-`active` subscription, if any
    async fn find_active_by_user(&self, user_id: Uuid) -> DbResult<Option<Subscription>>;

    async fn count_active_by_plan(&self, plan_id: Uuid) -> DbResult<i64>;

    /// Inner join against users and plans, newest first
    async fn list_with_details(
        &self,
        filter: &SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<SubscriptionDetail>>;

    /// Row count of the joined view
    async fn count_with_details(&self, filter: &SubscriptionFilter) -> DbResult<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            password_hash: String::new(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_filter_case_insensitive() {
        let ana = user("Ana Lopez", "ana@x.com");
        let filter = UserFilter {
            search: Some("LOP".into()),
        };
        assert!(filter.matches(&ana));

        let filter = UserFilter {
            search: Some("X.COM".into()),
        };
        assert!(filter.matches(&ana));

        let filter = UserFilter {
            search: Some("bob".into()),
        };
        assert!(!filter.matches(&ana));
        assert!(UserFilter::default().matches(&ana));
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(UserChanges::default().is_empty());
        assert!(PlanChanges::default().is_empty());
        assert!(SubscriptionChanges::default().is_empty());
        assert!(
            !PlanChanges {
                active: Some(false),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
