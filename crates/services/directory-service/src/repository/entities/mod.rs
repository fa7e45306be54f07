//! SeaORM entities.

pub mod credential;
pub mod review;
pub mod store;
pub mod store_heart;
pub mod user;
