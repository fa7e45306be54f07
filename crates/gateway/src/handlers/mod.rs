//! HTTP request handlers.

pub mod account_handler;
pub mod auth_handler;
pub mod health_handler;
pub mod review_handler;
pub mod store_handler;

pub use account_handler::account_routes;
pub use auth_handler::{auth_routes, session_routes};
pub use health_handler::health_routes;
pub use review_handler::{review_routes, reviewer_routes};
pub use store_handler::{store_owner_routes, store_routes};
