//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::account_handler::{ForgotRequest, ForgotResponse, ResetPasswordRequest};
use crate::handlers::auth_handler::{LoginRequest, RegisterRequest};
use crate::handlers::health_handler::{HealthResponse, ServiceHealth, ServiceStatus};
use crate::handlers::review_handler::ReviewRequest;
use crate::handlers::store_handler::{StoreFormDoc, StorePage};
use common::PaginationMeta;
use directory_service_lib::service::{AuthSession, TagPage, TokenResponse};
use domain::{
    Location, Review, ReviewDetail, ScoredStore, Store, StoreDetail, StoreSummary, TagCount,
    TopStore, UserResponse, UserSummary,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::auth_handler::register,
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::logout,
        crate::handlers::auth_handler::account,
        crate::handlers::account_handler::forgot,
        crate::handlers::account_handler::reset_form,
        crate::handlers::account_handler::reset,
        crate::handlers::store_handler::list_stores,
        crate::handlers::store_handler::list_stores_page,
        crate::handlers::store_handler::get_store,
        crate::handlers::store_handler::tags,
        crate::handlers::store_handler::stores_by_tag,
        crate::handlers::store_handler::top_stores,
        crate::handlers::store_handler::search_stores,
        crate::handlers::store_handler::map_stores,
        crate::handlers::store_handler::create_store,
        crate::handlers::store_handler::edit_store,
        crate::handlers::store_handler::update_store,
        crate::handlers::store_handler::hearted_stores,
        crate::handlers::store_handler::toggle_heart,
        crate::handlers::review_handler::add_review,
        crate::handlers::review_handler::store_reviews,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceStatus,
            ServiceHealth,
            RegisterRequest,
            LoginRequest,
            ForgotRequest,
            ForgotResponse,
            ResetPasswordRequest,
            ReviewRequest,
            StoreFormDoc,
            StorePage,
            PaginationMeta,
            AuthSession,
            TokenResponse,
            TagPage,
            TagCount,
            Location,
            Store,
            StoreDetail,
            StoreSummary,
            ScoredStore,
            TopStore,
            Review,
            ReviewDetail,
            UserResponse,
            UserSummary,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Dependency checks"),
        (name = "Authentication", description = "Registration, login and sessions"),
        (name = "Account", description = "Password reset"),
        (name = "Stores", description = "Store listings, search and hearts"),
        (name = "Reviews", description = "Store reviews"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
