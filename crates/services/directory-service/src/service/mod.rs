//! Application services layer.
//!
//! Services compose repository calls into the operations the gateway
//! exposes. They depend on repository and capability traits only.

mod account_service;
mod auth_service;
pub mod container;
mod review_service;
mod store_service;

pub use container::{ServiceContainer, Services};

pub use account_service::{
    generate_reset_token, reset_url, AccountManager, AccountService, ResetRequestOutcome,
};
pub use auth_service::{
    AuthService, AuthSession, Authenticator, Claims, Registration, TokenResponse,
};
pub use review_service::{ReviewManager, ReviewService};
pub use store_service::{StoreManager, StoreService, TagPage};

#[cfg(any(test, feature = "test-utils"))]
pub use account_service::MockAccountService;
#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use review_service::MockReviewService;
#[cfg(any(test, feature = "test-utils"))]
pub use store_service::MockStoreService;
