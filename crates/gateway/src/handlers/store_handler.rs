//! Store handlers: browsing, search, and owner-only editing.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use common::{AppError, AppResult, PageOutcome, PaginationMeta};
use directory_service_lib::service::TagPage;
use domain::{ScoredStore, Store, StoreDetail, StoreSummary, TopStore, UserResponse};

use crate::extractors::StoreForm;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// One page of stores.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorePage {
    pub stores: Vec<Store>,
    pub meta: PaginationMeta,
}

/// Multipart store form, as documented
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct StoreFormDoc {
    #[schema(example = "Javi's Coffee")]
    name: String,
    description: Option<String>,
    /// Repeat the field once per tag
    tags: Vec<String>,
    address: String,
    #[schema(example = -79.38)]
    lng: f64,
    #[schema(example = 43.65)]
    lat: f64,
    /// Image file, resized to 800px wide
    #[schema(value_type = Option<String>, format = Binary)]
    photo: Option<Vec<u8>>,
}

/// Text search query
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Words to match against store names and descriptions
    pub q: Option<String>,
}

/// Map search query
#[derive(Debug, Deserialize, IntoParams)]
pub struct NearQuery {
    pub lng: f64,
    pub lat: f64,
}

/// Public store routes
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(list_stores))
        .route("/stores/page/:page", get(list_stores_page))
        .route("/store/:slug", get(get_store))
        .route("/tags", get(tags))
        .route("/tags/:tag", get(stores_by_tag))
        .route("/top", get(top_stores))
        .route("/api/search", get(search_stores))
        .route("/api/stores/near", get(map_stores))
}

/// Store routes that need a signed-in user
pub fn store_owner_routes() -> Router<AppState> {
    Router::new()
        .route("/stores", post(create_store))
        .route("/stores/:id", post(update_store))
        .route("/stores/:id/edit", get(edit_store))
        .route("/hearts", get(hearted_stores))
        .route("/api/stores/:id/heart", post(toggle_heart))
}

/// First page of stores
#[utoipa::path(
    get,
    path = "/stores",
    tag = "Stores",
    responses((status = 200, description = "Newest stores", body = StorePage))
)]
pub async fn list_stores(State(state): State<AppState>) -> AppResult<Response> {
    page_response(&state, 1).await
}

/// A page of stores, newest first
#[utoipa::path(
    get,
    path = "/stores/page/{page}",
    tag = "Stores",
    params(("page" = u64, Path, description = "1-based page number")),
    responses(
        (status = 200, description = "Stores on the page", body = StorePage),
        (status = 303, description = "Page is past the end; redirects to the last page")
    )
)]
pub async fn list_stores_page(
    State(state): State<AppState>,
    Path(page): Path<u64>,
) -> AppResult<Response> {
    page_response(&state, page).await
}

async fn page_response(state: &AppState, page: u64) -> AppResult<Response> {
    match state.services.stores().list_stores(page).await? {
        PageOutcome::Page(page) => Ok(Json(StorePage {
            stores: page.data,
            meta: page.meta,
        })
        .into_response()),
        PageOutcome::Redirect(last) => {
            tracing::debug!(requested = page, redirect_to = last, "Page past the end");
            Ok(Redirect::to(&format!("/stores/page/{}", last)).into_response())
        }
    }
}

/// Store detail with author and reviews
#[utoipa::path(
    get,
    path = "/store/{slug}",
    tag = "Stores",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Store found", body = StoreDetail),
        (status = 404, description = "No store with that slug")
    )
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<StoreDetail>> {
    Ok(Json(state.services.stores().get_store_by_slug(&slug).await?))
}

/// Every tag with its count, and every tagged store
#[utoipa::path(
    get,
    path = "/tags",
    tag = "Stores",
    responses((status = 200, description = "Tag list and tagged stores", body = TagPage))
)]
pub async fn tags(State(state): State<AppState>) -> AppResult<Json<TagPage>> {
    Ok(Json(state.services.stores().tag_page(None).await?))
}

/// Every tag with its count, and the stores carrying one tag
#[utoipa::path(
    get,
    path = "/tags/{tag}",
    tag = "Stores",
    params(("tag" = String, Path, description = "Tag to filter by")),
    responses((status = 200, description = "Tag list and matching stores", body = TagPage))
)]
pub async fn stores_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> AppResult<Json<TagPage>> {
    Ok(Json(state.services.stores().tag_page(Some(tag)).await?))
}

/// Best rated stores
#[utoipa::path(
    get,
    path = "/top",
    tag = "Stores",
    responses((status = 200, description = "Stores by average rating", body = Vec<TopStore>))
)]
pub async fn top_stores(State(state): State<AppState>) -> AppResult<Json<Vec<TopStore>>> {
    Ok(Json(state.services.stores().top_stores().await?))
}

/// Full-text store search
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "Stores",
    params(SearchQuery),
    responses((status = 200, description = "Up to five stores, best match first", body = Vec<ScoredStore>))
)]
pub async fn search_stores(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<ScoredStore>>> {
    let q = query.q.unwrap_or_default();
    Ok(Json(state.services.stores().search(&q).await?))
}

/// Stores near a point
#[utoipa::path(
    get,
    path = "/api/stores/near",
    tag = "Stores",
    params(NearQuery),
    responses(
        (status = 200, description = "Up to ten stores, nearest first", body = Vec<StoreSummary>),
        (status = 400, description = "Missing or invalid coordinates")
    )
)]
pub async fn map_stores(
    State(state): State<AppState>,
    query: Result<Query<NearQuery>, axum::extract::rejection::QueryRejection>,
) -> AppResult<Json<Vec<StoreSummary>>> {
    let Query(query) =
        query.map_err(|_| AppError::validation("lng and lat must both be numbers"))?;
    Ok(Json(
        state.services.stores().map_stores(query.lng, query.lat).await?,
    ))
}

/// Create a store
#[utoipa::path(
    post,
    path = "/stores",
    tag = "Stores",
    security(("bearer_auth" = [])),
    request_body(content = StoreFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Store created", body = Store),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 415, description = "Photo is not an image")
    )
)]
pub async fn create_store(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    form: StoreForm,
) -> AppResult<(StatusCode, Json<Store>)> {
    let store = state
        .services
        .stores()
        .create_store(form.input, form.photo, current_user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// Load a store for editing
#[utoipa::path(
    get,
    path = "/stores/{id}/edit",
    tag = "Stores",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Store owned by the caller", body = Store),
        (status = 403, description = "Caller does not own the store"),
        (status = 404, description = "Store not found")
    )
)]
pub async fn edit_store(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Store>> {
    Ok(Json(
        state
            .services
            .stores()
            .get_store_for_edit(id, current_user.id)
            .await?,
    ))
}

/// Update a store
#[utoipa::path(
    post,
    path = "/stores/{id}",
    tag = "Stores",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Store ID")),
    request_body(content = StoreFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Store updated", body = Store),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller does not own the store"),
        (status = 404, description = "Store not found"),
        (status = 415, description = "Photo is not an image")
    )
)]
pub async fn update_store(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: StoreForm,
) -> AppResult<Json<Store>> {
    let store = state
        .services
        .stores()
        .update_store(id, form.input, form.photo, current_user.id)
        .await?;
    Ok(Json(store))
}

/// Stores the caller has hearted
#[utoipa::path(
    get,
    path = "/hearts",
    tag = "Stores",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Hearted stores", body = Vec<Store>))
)]
pub async fn hearted_stores(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Store>>> {
    Ok(Json(
        state.services.stores().hearted_stores(current_user.id).await?,
    ))
}

/// Heart or un-heart a store
#[utoipa::path(
    post,
    path = "/api/stores/{id}/heart",
    tag = "Stores",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Caller with updated hearts", body = UserResponse),
        (status = 404, description = "Store not found")
    )
)]
pub async fn toggle_heart(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .accounts()
        .toggle_heart(current_user.id, id)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
