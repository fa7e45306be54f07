//! Route configuration.

use axum::{middleware, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    account_routes, auth_routes, health_routes, review_routes, reviewer_routes, session_routes,
    store_owner_routes, store_routes,
};
use crate::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Browsing and search (no auth, general rate limit)
    let public = store_routes()
        .merge(review_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Login, registration and password reset (stricter rate limit)
    let credentials = auth_routes()
        .merge(account_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_auth_middleware,
        ));

    // Everything that acts as the signed-in user
    let protected = session_routes()
        .merge(store_owner_routes())
        .merge(reviewer_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no auth, no rate limit)
        .merge(health_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public)
        .merge(credentials)
        .merge(protected)
        .with_state(state)
}
