//! Middleware for authentication, rate limiting, and the cache they share.

mod auth;
mod cache;
mod rate_limit;

pub use auth::{auth_middleware, CurrentUser};
pub use cache::{CacheStore, RedisCache};
pub use rate_limit::{rate_limit_auth_middleware, rate_limit_middleware};
