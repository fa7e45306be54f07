//! Application state for dependency injection.

use std::sync::Arc;

use async_trait::async_trait;

use common::AppResult;
use directory_service_lib::infra::Database;
use directory_service_lib::ServiceContainer;

use crate::config::GatewayConfig;
use crate::middleware::CacheStore;

/// Liveness check for the database behind the services.
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl DatabaseProbe for Database {
    async fn ping(&self) -> AppResult<()> {
        Ok(Database::ping(self).await?)
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub cache: Arc<dyn CacheStore>,
    pub database: Arc<dyn DatabaseProbe>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        cache: Arc<dyn CacheStore>,
        database: Arc<dyn DatabaseProbe>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            services,
            cache,
            database,
            config,
        }
    }
}
