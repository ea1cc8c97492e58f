//! Application state

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use crate::auth::JwtService;
use crate::config::{Config, StorageBackend};
use crate::db::{
    MemoryPlanRepository, MemorySubscriptionRepository, MemoryUserRepository, PgPlanRepository,
    PgSubscriptionRepository, PgUserRepository, PlanRepository, SubscriptionRepository,
    UserRepository,
};
use crate::services::{PlanService, SubscriptionService, UserService};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
///
/// Built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Bearer token issuing and verification
    pub jwt: JwtService,
    pub users: UserService,
    pub plans: PlanService,
    pub subscriptions: SubscriptionService,
}

impl AppState {
    /// Connect the configured storage backend and wire the services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        match config.storage {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL must be set")?;
                let pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(url)
                    .await?;

                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Database migrations applied");

                Ok(Self::from_repos(
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgPlanRepository::new(pool.clone())),
                    Arc::new(PgSubscriptionRepository::new(pool)),
                    &config.jwt_secret,
                ))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                Ok(Self::in_memory(&config.jwt_secret))
            }
        }
    }

    /// Fresh in-memory stores
    pub fn in_memory(jwt_secret: &str) -> Self {
        let users = MemoryUserRepository::new();
        let plans = MemoryPlanRepository::new();
        let subscriptions = MemorySubscriptionRepository::new(users.clone(), plans.clone());
        Self::from_repos(
            Arc::new(users),
            Arc::new(plans),
            Arc::new(subscriptions),
            jwt_secret,
        )
    }

    pub fn from_repos(
        users: Arc<dyn UserRepository>,
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        jwt_secret: &str,
    ) -> Self {
        let jwt = JwtService::new(jwt_secret);
        Self {
            users: UserService::new(users.clone(), jwt.clone()),
            plans: PlanService::new(plans.clone(), subscriptions.clone()),
            subscriptions: SubscriptionService::new(subscriptions, users, plans),
            jwt,
        }
    }
}
