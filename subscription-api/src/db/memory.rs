//! In-memory repositories
//!
//! Back the `memory` storage backend and the test suites. Uniqueness rules
//! mirror the PostgreSQL indexes and are enforced atomically through
//! DashMap entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::models::{Plan, Subscription, SubscriptionState, User};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

use super::{
    DbError, DbResult, NewPlan, NewSubscription, NewUser, ONE_ACTIVE_PER_USER, PlanChanges,
    PlanFilter, PlanRepository, SubscriptionChanges, SubscriptionDetail, SubscriptionFilter,
    SubscriptionRepository, USERS_EMAIL_KEY, UserChanges, UserFilter, UserRepository,
};

/// Strictly increasing creation timestamps (microsecond resolution, like
/// `TIMESTAMPTZ`), so "newest first" is deterministic
#[derive(Default, Clone)]
struct Clock {
    last_micros: Arc<AtomicI64>,
}

impl Clock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let prev = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or(wall);
        let micros = wall.max(prev + 1);
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}

fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

// ========== Users ==========

/// In-memory user repository
#[derive(Default, Clone)]
pub struct MemoryUserRepository {
    users: Arc<DashMap<Uuid, User>>,
    by_email: Arc<DashMap<String, Uuid>>,
    clock: Clock,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, id: &Uuid) -> Option<User> {
        self.users.get(id).map(|r| r.value().clone())
    }

    fn filtered(&self, filter: &UserFilter) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        users
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> DbResult<User> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(DbError::UniqueViolation(USERS_EMAIL_KEY.into())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        let row = User {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            active: true,
            created_at: self.clock.now(),
        };
        self.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.get(&id))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let id = self.by_email.get(email).map(|r| *r.value());
        Ok(id.and_then(|id| self.get(&id)))
    }

    async fn list(&self, filter: &UserFilter, limit: i64, offset: i64) -> DbResult<Vec<User>> {
        Ok(paginate(self.filtered(filter), limit, offset))
    }

    async fn count(&self, filter: &UserFilter) -> DbResult<i64> {
        Ok(self.users.iter().filter(|r| filter.matches(r.value())).count() as i64)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> DbResult<User> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> DbResult<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.active = false;
        Ok(())
    }
}

// ========== Plans ==========

/// In-memory plan repository
#[derive(Default, Clone)]
pub struct MemoryPlanRepository {
    plans: Arc<DashMap<Uuid, Plan>>,
    clock: Clock,
}

impl MemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, id: &Uuid) -> Option<Plan> {
        self.plans.get(id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl PlanRepository for MemoryPlanRepository {
    async fn create(&self, plan: NewPlan) -> DbResult<Plan> {
        let row = Plan {
            id: plan.id,
            name: plan.name,
            description: plan.description,
            price: plan.price,
            active: true,
            created_at: self.clock.now(),
        };
        self.plans.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Plan>> {
        Ok(self.get(&id))
    }

    async fn list(&self, filter: &PlanFilter, limit: i64, offset: i64) -> DbResult<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .plans
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then(a.created_at.cmp(&b.created_at)));
        Ok(paginate(plans, limit, offset))
    }

    async fn count(&self, filter: &PlanFilter) -> DbResult<i64> {
        Ok(self.plans.iter().filter(|r| filter.matches(r.value())).count() as i64)
    }

    async fn update(&self, id: Uuid, changes: PlanChanges) -> DbResult<Plan> {
        let mut plan = self.plans.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = changes.name {
            plan.name = name;
        }
        if let Some(description) = changes.description {
            plan.description = description;
        }
        if let Some(price) = changes.price {
            plan.price = price;
        }
        if let Some(active) = changes.active {
            plan.active = active;
        }
        Ok(plan.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> DbResult<()> {
        let mut plan = self.plans.get_mut(&id).ok_or(DbError::NotFound)?;
        plan.active = false;
        Ok(())
    }
}

// ========== Subscriptions ==========

/// In-memory subscription repository
///
/// Holds handles to the user and plan stores for the joined view.
#[derive(Clone)]
pub struct MemorySubscriptionRepository {
    subscriptions: Arc<DashMap<Uuid, Subscription>>,
    /// user_id → id of that user's active subscription
    active_by_user: Arc<DashMap<Uuid, Uuid>>,
    users: MemoryUserRepository,
    plans: MemoryPlanRepository,
    clock: Clock,
}

impl MemorySubscriptionRepository {
    pub fn new(users: MemoryUserRepository, plans: MemoryPlanRepository) -> Self {
        Self {
            subscriptions: Arc::new(DashMap::new()),
            active_by_user: Arc::new(DashMap::new()),
            users,
            plans,
            clock: Clock::default(),
        }
    }

    fn filtered(&self, filter: &SubscriptionFilter) -> Vec<Subscription> {
        let mut subs: Vec<Subscription> = self
            .subscriptions
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        subs
    }

    fn joined(&self, filter: &SubscriptionFilter) -> Vec<SubscriptionDetail> {
        self.filtered(filter)
            .into_iter()
            .filter_map(|subscription| {
                let user = self.users.get(&subscription.user_id)?;
                let plan = self.plans.get(&subscription.plan_id)?;
                Some(SubscriptionDetail {
                    subscription,
                    user,
                    plan,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for MemorySubscriptionRepository {
    async fn create(&self, sub: NewSubscription) -> DbResult<Subscription> {
        match self.active_by_user.entry(sub.user_id) {
            Entry::Occupied(_) => {
                return Err(DbError::UniqueViolation(ONE_ACTIVE_PER_USER.into()));
            }
            Entry::Vacant(slot) => {
                slot.insert(sub.id);
            }
        }
        let row = Subscription {
            id: sub.id,
            user_id: sub.user_id,
            plan_id: sub.plan_id,
            start_date: sub.start_date,
            end_date: sub.end_date,
            state: SubscriptionState::Active,
            created_at: self.clock.now(),
        };
        self.subscriptions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Subscription>> {
        Ok(self.subscriptions.get(&id).map(|r| r.value().clone()))
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Subscription>> {
        Ok(paginate(self.filtered(filter), limit, offset))
    }

    async fn count(&self, filter: &SubscriptionFilter) -> DbResult<i64> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| filter.matches(r.value()))
            .count() as i64)
    }

    async fn update(&self, id: Uuid, changes: SubscriptionChanges) -> DbResult<Subscription> {
        let mut sub = self.subscriptions.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(state) = changes.state {
            let was_active = sub.state == SubscriptionState::Active;
            let now_active = state == SubscriptionState::Active;
            if now_active && !was_active {
                match self.active_by_user.entry(sub.user_id) {
                    Entry::Occupied(slot) if *slot.get() != id => {
                        return Err(DbError::UniqueViolation(ONE_ACTIVE_PER_USER.into()));
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
            } else if was_active && !now_active {
                self.active_by_user.remove_if(&sub.user_id, |_, active| *active == id);
            }
            sub.state = state;
        }
        if let Some(end_date) = changes.end_date {
            sub.end_date = end_date;
        }
        Ok(sub.clone())
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> DbResult<Option<Subscription>> {
        let id = self.active_by_user.get(&user_id).map(|r| *r.value());
        Ok(id.and_then(|id| self.subscriptions.get(&id).map(|r| r.value().clone())))
    }

    async fn count_active_by_plan(&self, plan_id: Uuid) -> DbResult<i64> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| r.plan_id == plan_id && r.state == SubscriptionState::Active)
            .count() as i64)
    }

    async fn list_with_details(
        &self,
        filter: &SubscriptionFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<SubscriptionDetail>> {
        Ok(paginate(self.joined(filter), limit, offset))
    }

    async fn count_with_details(&self, filter: &SubscriptionFilter) -> DbResult<i64> {
        Ok(self.joined(filter).len() as i64)
    }
}
