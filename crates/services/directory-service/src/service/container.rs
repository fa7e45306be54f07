//! Service container - one place to reach every application service.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::{
    AccountManager, AccountService, AuthService, Authenticator, ReviewManager, ReviewService,
    StoreManager, StoreService,
};
use crate::config::DirectoryConfig;
use crate::infra::{mailer_from_config, LocalPhotoStorage};
use crate::repository::{CredentialStore, ReviewStore, StoreStore, UserStore};
use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Access to the application services, for handlers.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn stores(&self) -> Arc<dyn StoreService>;

    fn reviews(&self) -> Arc<dyn ReviewService>;

    fn accounts(&self) -> Arc<dyn AccountService>;

    fn auth(&self) -> Arc<dyn AuthService>;
}

pub struct Services {
    store_service: Arc<dyn StoreService>,
    review_service: Arc<dyn ReviewService>,
    account_service: Arc<dyn AccountService>,
    auth_service: Arc<dyn AuthService>,
}

impl Services {
    pub fn new(
        store_service: Arc<dyn StoreService>,
        review_service: Arc<dyn ReviewService>,
        account_service: Arc<dyn AccountService>,
        auth_service: Arc<dyn AuthService>,
    ) -> Self {
        Self {
            store_service,
            review_service,
            account_service,
            auth_service,
        }
    }

    /// Wire every repository and service onto one database connection.
    pub fn from_connection(db: DatabaseConnection, config: &DirectoryConfig) -> AppResult<Self> {
        let users = Arc::new(UserStore::new(db.clone()));
        let stores = Arc::new(StoreStore::new(db.clone()));
        let reviews = Arc::new(ReviewStore::new(db.clone()));
        let credentials = Arc::new(CredentialStore::new(db));

        let mailer = mailer_from_config(&config.mail)?;
        let photos = Arc::new(LocalPhotoStorage::new(config.upload_dir.clone()));

        let auth_service: Arc<dyn AuthService> = Arc::new(Authenticator::new(
            users.clone(),
            credentials,
            config.jwt.clone(),
        ));
        let store_service = Arc::new(StoreManager::new(stores.clone(), users.clone(), photos));
        let review_service = Arc::new(ReviewManager::new(reviews, stores.clone()));
        let account_service = Arc::new(AccountManager::new(
            users,
            stores,
            auth_service.clone(),
            mailer,
        ));

        Ok(Self::new(
            store_service,
            review_service,
            account_service,
            auth_service,
        ))
    }
}

impl ServiceContainer for Services {
    fn stores(&self) -> Arc<dyn StoreService> {
        self.store_service.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewService> {
        self.review_service.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountService> {
        self.account_service.clone()
    }

    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }
}
