//! Authentication: JWT issuing/verification and the access gate

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtError, JwtService};
pub use middleware::require_auth;
