//! subscription-api: users, plans and subscriptions over HTTP
//!
//! Users register and log in for a bearer token; plans form a priced
//! catalog; each user holds at most one active subscription at a time.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod util;

pub use api::create_router;
pub use config::Config;
pub use state::AppState;
