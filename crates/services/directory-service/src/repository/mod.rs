//! Repository layer for data access.

pub mod entities;
mod credential_repository;
mod review_repository;
mod store_repository;
mod user_repository;

pub use credential_repository::{CredentialRepository, CredentialStore};
pub use review_repository::{ReviewRepository, ReviewStore};
pub use store_repository::{StoreRepository, StoreStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use credential_repository::MockCredentialRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use review_repository::MockReviewRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use store_repository::MockStoreRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
