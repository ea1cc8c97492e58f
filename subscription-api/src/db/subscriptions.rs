//! PostgreSQL subscription repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{Plan, Subscription, SubscriptionState, User};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    DbError, DbResult, NewSubscription, SubscriptionChanges, SubscriptionDetail,
    SubscriptionFilter, SubscriptionRepository,
};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_id, start_date, end_date, state, created_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row of the subscriptions ⨝ users ⨝ plans query
#[derive(sqlx::FromRow)]
struct DetailRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    state: SubscriptionState,
    created_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
    user_phone: String,
    user_password_hash: String,
    user_active: bool,
    user_created_at: DateTime<Utc>,
    plan_name: String,
    plan_description: String,
    plan_price: Decimal,
    plan_active: bool,
    plan_created_at: DateTime<Utc>,
}

impl From<DetailRow> for SubscriptionDetail {
    fn from(row: DetailRow) -> Self {
        Self {
            subscription: Subscription {
                id: row.id,
                user_id: row.user_id,
                plan_id: row.plan_id,
                start_date: row.start_date,
                end_date: row.end_date,
                state: row.state,
                created_at: row.created_at,
            },
            user: User {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                phone: row.user_phone,
                password_hash: row.user_password_hash,
                active: row.user_active,
                created_at: row.user_created_at,
            },
            plan: Plan {
                id: row.plan_id,
                name: row.plan_name,
                description: row.plan_description,
                price: row.plan_price,
                active: row.plan_active,
                created_at: row.plan_created_at,
            },
        }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn create(&self, sub: NewSubscription) -> DbResult<Subscription> {
        let row = sqlx::query_as::<_, Subscription>(&format!(
            "INSERT INTO subscriptions (id, user_id, plan_id, start_date, end_date, state, created_at)
             VALUES ($1, $2, $3, $4, $5, 'active', NOW())
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(sub.plan_id)
        .bind(sub.start_date)
        .bind(sub.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Subscription>> {
        let sub = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Subscription>> {
        let subs = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             WHERE ($1::UUID IS NULL OR user_id = $1)
             ORDER BY created_at DESC, id
             LIMIT $2 OFFSET $3"
        ))
        .bind(filter.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(subs)
    }

    async fn count(&self, filter: &SubscriptionFilter) -> DbResult<i64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE ($1::UUID IS NULL OR user_id = $1)",
        )
        .bind(filter.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn update(&self, id: Uuid, changes: SubscriptionChanges) -> DbResult<Subscription> {
        sqlx::query_as::<_, Subscription>(&format!(
            "UPDATE subscriptions SET
                end_date = COALESCE($1, end_date),
                state = COALESCE($2, state)
             WHERE id = $3
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(changes.end_date)
        .bind(changes.state.map(|s| s.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> DbResult<Option<Subscription>> {
        let sub = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             WHERE user_id = $1 AND state = 'active'
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    async fn count_active_by_plan(&self, plan_id: Uuid) -> DbResult<i64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE plan_id = $1 AND state = 'active'",
        )
        .bind(plan_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn list_with_details(
        &self,
        filter: &SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<SubscriptionDetail>> {
        let rows = sqlx::query_as::<_, DetailRow>(
            "SELECT s.id, s.user_id, s.plan_id, s.start_date, s.end_date, s.state, s.created_at,
                    u.name AS user_name, u.email AS user_email, u.phone AS user_phone,
                    u.password_hash AS user_password_hash, u.active AS user_active,
                    u.created_at AS user_created_at,
                    p.name AS plan_name, p.description AS plan_description,
                    p.price AS plan_price, p.active AS plan_active,
                    p.created_at AS plan_created_at
             FROM subscriptions s
             JOIN users u ON u.id = s.user_id
             JOIN plans p ON p.id = s.plan_id
             WHERE ($1::UUID IS NULL OR s.user_id = $1)
             ORDER BY s.created_at DESC, s.id
             LIMIT $2 OFFSET $3",
        )
        .bind(filter.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SubscriptionDetail::from).collect())
    }

    async fn count_with_details(&self, filter: &SubscriptionFilter) -> DbResult<i64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions s
             JOIN users u ON u.id = s.user_id
             JOIN plans p ON p.id = s.plan_id
             WHERE ($1::UUID IS NULL OR s.user_id = $1)",
        )
        .bind(filter.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
