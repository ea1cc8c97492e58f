//! Subscription lifecycle
//!
//! States are `active`, `expired` and `cancelled`; nothing moves a record
//! between them except an explicit update or cancellation. A user holds at
//! most one stored-`active` subscription at a time.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Subscription, SubscriptionCreate, SubscriptionResponse, SubscriptionState, SubscriptionUpdate,
    UserResponse,
};
use shared::pagination::Page;
use uuid::Uuid;

use super::{Paged, parse_id};
use crate::db::{
    NewSubscription, PlanRepository, SubscriptionChanges, SubscriptionFilter,
    SubscriptionRepository, UserRepository,
};
use crate::error::{ServiceError, ServiceResult};

/// Wire format of subscription dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DD` at midnight UTC
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Same day next month; days past the end of a short month roll over
/// into the following one (Jan 31 → Mar 2 in a leap year, Mar 3 otherwise)
pub fn one_month_after(start: DateTime<Utc>) -> DateTime<Utc> {
    start
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|first| first.checked_add_days(Days::new(u64::from(start.day0()))))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Optional creation date: unparseable input falls back instead of failing
fn lenient_date(raw: Option<&str>, field: &str) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        tracing::debug!(field, value = raw, "Ignoring unparseable date");
    }
    parsed
}

#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
    plans: Arc<dyn PlanRepository>,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserRepository>,
        plans: Arc<dyn PlanRepository>,
    ) -> Self {
        Self {
            subscriptions,
            users,
            plans,
        }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Subscription> {
        self.subscriptions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound).into())
    }

    fn view(subscription: Subscription) -> SubscriptionResponse {
        SubscriptionResponse::new(subscription, Utc::now())
    }

    /// Checks run in order and short-circuit: user, plan, existing active
    /// subscription. Nothing is written on failure.
    pub async fn create(&self, req: SubscriptionCreate) -> ServiceResult<SubscriptionResponse> {
        let user_id = parse_id(&req.user_id, "user")?;
        let plan_id = parse_id(&req.plan_id, "plan")?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        if !user.is_active() {
            return Err(AppError::new(ErrorCode::UserInactive).into());
        }

        let plan = self
            .plans
            .find_by_id(plan_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound))?;
        if !plan.is_active() {
            return Err(AppError::new(ErrorCode::PlanInactive).into());
        }

        if let Some(existing) = self.subscriptions.find_active_by_user(user_id).await? {
            return Err(AppError::new(ErrorCode::AlreadySubscribed)
                .with_detail("subscription_id", existing.id.to_string())
                .into());
        }

        let now = Utc::now();
        let start_date = lenient_date(req.start_date.as_deref(), "start_date").unwrap_or(now);
        let end_date = lenient_date(req.end_date.as_deref(), "end_date")
            .unwrap_or_else(|| one_month_after(start_date));
        if end_date < start_date {
            return Err(AppError::validation(
                "end_date",
                "end_date must not be before start_date",
            )
            .into());
        }

        // The unique index still catches a concurrent create
        let subscription = self
            .subscriptions
            .create(NewSubscription {
                id: Uuid::new_v4(),
                user_id,
                plan_id,
                start_date,
                end_date,
            })
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %user_id,
            plan_id = %plan_id,
            "Subscription created"
        );
        Ok(Self::view(subscription)
            .with_user(UserResponse::from(user))
            .with_plan(plan))
    }

    pub async fn get(&self, raw_id: &str) -> ServiceResult<SubscriptionResponse> {
        let id = parse_id(raw_id, "subscription")?;
        Ok(Self::view(self.load(id).await?))
    }

    /// Partial update of end date and/or state
    ///
    /// A cancelled subscription cannot move to another state, and moving
    /// into `active` fails while the user holds a different active one.
    pub async fn update(
        &self,
        raw_id: &str,
        req: SubscriptionUpdate,
    ) -> ServiceResult<SubscriptionResponse> {
        let id = parse_id(raw_id, "subscription")?;

        if req.end_date.is_none() && req.state.is_none() {
            return Err(AppError::new(ErrorCode::NothingToUpdate).into());
        }

        let end_date = req
            .end_date
            .as_deref()
            .map(|raw| parse_date(raw).ok_or_else(|| AppError::new(ErrorCode::InvalidDateFormat)))
            .transpose()?;
        let state = req
            .state
            .as_deref()
            .map(|raw| {
                raw.trim()
                    .parse::<SubscriptionState>()
                    .map_err(|_| AppError::new(ErrorCode::InvalidState))
            })
            .transpose()?;

        let current = self.load(id).await?;

        if let Some(next) = state {
            if current.state == SubscriptionState::Cancelled && next != SubscriptionState::Cancelled
            {
                return Err(AppError::new(ErrorCode::SubscriptionCancelled).into());
            }
            if next == SubscriptionState::Active && current.state != SubscriptionState::Active {
                if let Some(other) = self
                    .subscriptions
                    .find_active_by_user(current.user_id)
                    .await?
                    .filter(|other| other.id != id)
                {
                    return Err(AppError::new(ErrorCode::AlreadySubscribed)
                        .with_detail("subscription_id", other.id.to_string())
                        .into());
                }
            }
        }

        let updated = self
            .subscriptions
            .update(id, SubscriptionChanges { end_date, state })
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::SubscriptionNotFound))?;

        tracing::info!(subscription_id = %id, state = %updated.state, "Subscription updated");
        Ok(Self::view(updated))
    }

    /// Force `cancelled` with end date = now; cancelling again succeeds and
    /// refreshes the end date
    pub async fn cancel(&self, raw_id: &str) -> ServiceResult<SubscriptionResponse> {
        let id = parse_id(raw_id, "subscription")?;
        let changes = SubscriptionChanges {
            end_date: Some(Utc::now()),
            state: Some(SubscriptionState::Cancelled),
        };
        let cancelled = self
            .subscriptions
            .update(id, changes)
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::SubscriptionNotFound))?;

        tracing::info!(subscription_id = %id, "Subscription cancelled");
        Ok(Self::view(cancelled))
    }

    pub async fn list(&self, page: Page) -> ServiceResult<Paged<SubscriptionResponse>> {
        self.list_filtered(SubscriptionFilter::default(), page).await
    }

    pub async fn list_by_user(
        &self,
        raw_user_id: &str,
        page: Page,
    ) -> ServiceResult<Paged<SubscriptionResponse>> {
        let user_id = parse_id(raw_user_id, "user")?;
        self.list_filtered(SubscriptionFilter::for_user(user_id), page)
            .await
    }

    /// The caller's own subscriptions
    pub async fn list_mine(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> ServiceResult<Paged<SubscriptionResponse>> {
        self.list_filtered(SubscriptionFilter::for_user(user_id), page)
            .await
    }

    async fn list_filtered(
        &self,
        filter: SubscriptionFilter,
        page: Page,
    ) -> ServiceResult<Paged<SubscriptionResponse>> {
        let subscriptions = self
            .subscriptions
            .list(&filter, page.limit as i64, page.offset())
            .await?;
        let total = self.subscriptions.count(&filter).await?;
        let now = Utc::now();
        Ok(Paged {
            items: subscriptions
                .into_iter()
                .map(|s| SubscriptionResponse::new(s, now))
                .collect(),
            meta: page.meta(total),
        })
    }

    /// Joined view with user and plan snapshots; records whose user or
    /// plan no longer resolves are left out
    pub async fn list_with_details(
        &self,
        page: Page,
    ) -> ServiceResult<Paged<SubscriptionResponse>> {
        let filter = SubscriptionFilter::default();
        let details = self
            .subscriptions
            .list_with_details(&filter, page.limit as i64, page.offset())
            .await?;
        let total = self.subscriptions.count_with_details(&filter).await?;
        let now = Utc::now();
        Ok(Paged {
            items: details
                .into_iter()
                .map(|d| {
                    SubscriptionResponse::new(d.subscription, now)
                        .with_user(UserResponse::from(d.user))
                        .with_plan(d.plan)
                })
                .collect(),
            meta: page.meta(total),
        })
    }
}
