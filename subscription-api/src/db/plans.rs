//! PostgreSQL plan repository

use async_trait::async_trait;
use shared::models::Plan;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DbError, DbResult, NewPlan, PlanChanges, PlanFilter, PlanRepository};

const PLAN_COLUMNS: &str = "id, name, description, price, active, created_at";

/// PostgreSQL plan repository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn create(&self, plan: NewPlan) -> DbResult<Plan> {
        let row = sqlx::query_as::<_, Plan>(&format!(
            "INSERT INTO plans (id, name, description, price, active, created_at)
             VALUES ($1, $2, $3, $4, TRUE, NOW())
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Plan>> {
        let plan =
            sqlx::query_as::<_, Plan>(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(plan)
    }

    async fn list(&self, filter: &PlanFilter, limit: i64, offset: i64) -> DbResult<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans
             WHERE ($1 OR active)
             ORDER BY price ASC, created_at
             LIMIT $2 OFFSET $3"
        ))
        .bind(filter.include_inactive)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    async fn count(&self, filter: &PlanFilter) -> DbResult<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plans WHERE ($1 OR active)")
            .bind(filter.include_inactive)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn update(&self, id: Uuid, changes: PlanChanges) -> DbResult<Plan> {
        sqlx::query_as::<_, Plan>(&format!(
            "UPDATE plans SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                active = COALESCE($4, active)
             WHERE id = $5
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    async fn soft_delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("UPDATE plans SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
