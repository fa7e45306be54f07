//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Stores, reviews and users are shared by the directory service and the gateway.

pub mod constants;
pub mod error;
pub mod password;
pub mod review;
pub mod slug;
pub mod store;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use review::{NewReview, Review, ReviewDetail};
pub use store::{
    Location, ScoredStore, Store, StoreDetail, StoreInput, StoreSummary, TagCount, TopStore,
    ValidStore,
};
pub use user::{NewUser, User, UserResponse, UserSummary};
