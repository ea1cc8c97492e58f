//! Plan lifecycle: catalog management with a deletion guard

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{Plan, PlanCreate, PlanUpdate};
use shared::pagination::Page;
use uuid::Uuid;

use super::{Paged, parse_id};
use crate::db::{NewPlan, PlanChanges, PlanFilter, PlanRepository, SubscriptionRepository};
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct PlanService {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl PlanService {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            plans,
            subscriptions,
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Plan> {
        self.plans
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound).into())
    }

    pub async fn create(&self, req: PlanCreate) -> ServiceResult<Plan> {
        let plan = self
            .plans
            .create(NewPlan {
                id: Uuid::new_v4(),
                name: req.name.trim().to_string(),
                description: req.description.trim().to_string(),
                price: req.price,
            })
            .await?;
        tracing::info!(plan_id = %plan.id, name = %plan.name, "Plan created");
        Ok(plan)
    }

    pub async fn get(&self, raw_id: &str) -> ServiceResult<Plan> {
        let id = parse_id(raw_id, "plan")?;
        self.load(id).await
    }

    /// Active plans only unless `include_inactive`; cheapest first
    pub async fn list(&self, include_inactive: bool, page: Page) -> ServiceResult<Paged<Plan>> {
        let filter = PlanFilter { include_inactive };
        let items = self
            .plans
            .list(&filter, page.limit as i64, page.offset())
            .await?;
        let total = self.plans.count(&filter).await?;
        Ok(Paged {
            items,
            meta: page.meta(total),
        })
    }

    pub async fn list_active(&self, page: Page) -> ServiceResult<Paged<Plan>> {
        self.list(false, page).await
    }

    pub async fn update(&self, raw_id: &str, req: PlanUpdate) -> ServiceResult<Plan> {
        let id = parse_id(raw_id, "plan")?;

        let changes = PlanChanges {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description.map(|d| d.trim().to_string()),
            price: req.price,
            active: req.active,
        };
        if changes.is_empty() {
            return Err(AppError::new(ErrorCode::NothingToUpdate).into());
        }

        let plan = self
            .plans
            .update(id, changes)
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::PlanNotFound))?;
        tracing::info!(plan_id = %id, "Plan updated");
        Ok(plan)
    }

    /// Soft delete, refused while any subscription on the plan is active.
    ///
    /// Count-then-write: a subscription created in between is not caught.
    pub async fn delete(&self, raw_id: &str) -> ServiceResult<()> {
        let id = parse_id(raw_id, "plan")?;
        self.load(id).await?;

        let active = self.subscriptions.count_active_by_plan(id).await?;
        if active > 0 {
            return Err(AppError::new(ErrorCode::PlanInUse)
                .with_detail("active_subscriptions", active)
                .into());
        }

        self.plans
            .soft_delete(id)
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::PlanNotFound))?;
        tracing::info!(plan_id = %id, "Plan deactivated");
        Ok(())
    }
}
