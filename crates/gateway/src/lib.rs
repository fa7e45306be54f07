//! API Gateway Library
//!
//! The HTTP surface of the store directory: an axum router over the
//! directory services, with bearer authentication, Redis rate limiting
//! and an OpenAPI document.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use directory_service_lib::infra::Database;
use directory_service_lib::{DirectoryConfig, Services};

use crate::config::GatewayConfig;
use crate::middleware::RedisCache;
use crate::routes::create_router;
use crate::state::AppState;

/// Connect to Postgres and Redis, then serve HTTP until shutdown.
pub async fn run_server(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GatewayConfig::from_env();
    config.host = host.to_string();
    config.port = port;
    let directory = DirectoryConfig::from_env()?;

    // Database (migrations run on connect)
    let database = Database::connect(&directory.database).await?;
    let services = Services::from_connection(database.handle(), &directory)?;

    // Create cache
    let cache = RedisCache::connect(&config.redis_url).await?;

    let state = AppState::new(
        Arc::new(services),
        Arc::new(cache),
        Arc::new(database),
        config,
    );

    let app = create_router(state)
        .nest_service("/uploads", ServeDir::new(&directory.upload_dir))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
