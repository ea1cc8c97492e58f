//! Subscription Model

use super::{Plan, UserResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Subscription lifecycle state
///
/// Stored as lowercase text. There is no background transition: a record
/// stays `active` past its end date until someone updates or cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown state string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid subscription state: {0}")]
pub struct InvalidState(pub String);

impl FromStr for SubscriptionState {
    type Err = InvalidState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(InvalidState(other.to_string())),
        }
    }
}

impl TryFrom<String> for SubscriptionState {
    type Error = InvalidState;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Subscription row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    /// Exclusive upper bound of coverage
    pub end_date: DateTime<Utc>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub state: SubscriptionState,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Stored `active` and not yet past its end date
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.state == SubscriptionState::Active && now < self.end_date
    }

    /// Coverage window has ended, whatever the stored state says
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }
}

/// Subscription view returned by the API
///
/// `user` and `plan` are snapshots resolved at response time; they are
/// never persisted with the subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub is_current: bool,
    pub is_expired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

impl SubscriptionResponse {
    pub fn new(subscription: Subscription, now: DateTime<Utc>) -> Self {
        Self {
            is_current: subscription.is_current(now),
            is_expired: subscription.is_expired(now),
            subscription,
            user: None,
            plan: None,
        }
    }

    pub fn with_user(mut self, user: UserResponse) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }
}

/// Create subscription payload
///
/// Ids arrive as strings so a malformed id can be reported as such
/// instead of a generic JSON error. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCreate {
    pub user_id: String,
    pub plan_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Update subscription payload (only supplied fields are written)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub end_date: Option<String>,
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(state: SubscriptionState, end_in: Duration) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            start_date: now - Duration::days(1),
            end_date: now + end_in,
            state,
            created_at: now,
        }
    }

    #[test]
    fn test_state_parse() {
        assert_eq!(
            "cancelled".parse::<SubscriptionState>(),
            Ok(SubscriptionState::Cancelled)
        );
        assert!("paused".parse::<SubscriptionState>().is_err());
        assert!("Active".parse::<SubscriptionState>().is_err());
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&SubscriptionState::Expired).unwrap();
        assert_eq!(json, "\"expired\"");
    }

    #[test]
    fn test_current_and_expired() {
        let now = Utc::now();
        let live = sample(SubscriptionState::Active, Duration::days(10));
        assert!(live.is_current(now));
        assert!(!live.is_expired(now));

        let lapsed = sample(SubscriptionState::Active, Duration::days(-1));
        assert!(!lapsed.is_current(now));
        assert!(lapsed.is_expired(now));

        let cancelled = sample(SubscriptionState::Cancelled, Duration::days(10));
        assert!(!cancelled.is_current(now));
    }

    #[test]
    fn test_response_flattens_record() {
        let sub = sample(SubscriptionState::Active, Duration::days(5));
        let id = sub.id;
        let json = serde_json::to_value(SubscriptionResponse::new(sub, Utc::now())).unwrap();
        assert_eq!(json["id"], serde_json::json!(id));
        assert_eq!(json["state"], "active");
        assert_eq!(json["is_current"], true);
        assert!(json.get("user").is_none());
    }
}
