//! Store service - create, browse, search and edit store listings.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::infra::photos::{PhotoStorage, PhotoUpload};
use crate::repository::{StoreRepository, UserRepository};
use common::{AppError, AppResult, OptionExt, PageOutcome, PageRequest};
use domain::{
    ScoredStore, Store, StoreDetail, StoreInput, StoreSummary, TagCount, TopStore,
    NEAR_MAX_DISTANCE_METERS, NEAR_SEARCH_LIMIT, STORES_PER_PAGE, TEXT_SEARCH_LIMIT,
    TOP_STORES_LIMIT,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Everything the tag page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagPage {
    pub tags: Vec<TagCount>,
    /// Selected tag, if any
    pub tag: Option<String>,
    pub stores: Vec<Store>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StoreService: Send + Sync {
    async fn create_store(
        &self,
        input: StoreInput,
        photo: Option<PhotoUpload>,
        author_id: Uuid,
    ) -> AppResult<Store>;

    async fn get_store_by_slug(&self, slug: &str) -> AppResult<StoreDetail>;

    /// One page of stores, newest first; overflow becomes a redirect
    async fn list_stores(&self, page: u64) -> AppResult<PageOutcome<Store>>;

    /// Load a store for its edit form; only the owner may
    async fn get_store_for_edit(&self, id: Uuid, user_id: Uuid) -> AppResult<Store>;

    async fn update_store(
        &self,
        id: Uuid,
        input: StoreInput,
        photo: Option<PhotoUpload>,
        user_id: Uuid,
    ) -> AppResult<Store>;

    async fn tag_page(&self, tag: Option<String>) -> AppResult<TagPage>;

    async fn search(&self, query: &str) -> AppResult<Vec<ScoredStore>>;

    async fn map_stores(&self, lng: f64, lat: f64) -> AppResult<Vec<StoreSummary>>;

    async fn top_stores(&self) -> AppResult<Vec<TopStore>>;

    /// Stores the user has hearted
    async fn hearted_stores(&self, user_id: Uuid) -> AppResult<Vec<Store>>;
}

pub struct StoreManager {
    stores: Arc<dyn StoreRepository>,
    users: Arc<dyn UserRepository>,
    photos: Arc<dyn PhotoStorage>,
}

impl StoreManager {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        users: Arc<dyn UserRepository>,
        photos: Arc<dyn PhotoStorage>,
    ) -> Self {
        Self {
            stores,
            users,
            photos,
        }
    }

    async fn save_photo(&self, photo: Option<PhotoUpload>) -> AppResult<Option<String>> {
        match photo {
            Some(upload) => Ok(Some(self.photos.save(upload).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StoreService for StoreManager {
    async fn create_store(
        &self,
        input: StoreInput,
        photo: Option<PhotoUpload>,
        author_id: Uuid,
    ) -> AppResult<Store> {
        let mut valid = input.validate()?;
        if let Some(filename) = self.save_photo(photo).await? {
            valid.photo = Some(filename);
        }

        let store = self.stores.create(valid, author_id).await?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");
        Ok(store)
    }

    async fn get_store_by_slug(&self, slug: &str) -> AppResult<StoreDetail> {
        self.stores.find_by_slug(slug).await?.ok_or_not_found()
    }

    async fn list_stores(&self, page: u64) -> AppResult<PageOutcome<Store>> {
        self.stores
            .list(PageRequest::new(page, STORES_PER_PAGE))
            .await
    }

    async fn get_store_for_edit(&self, id: Uuid, user_id: Uuid) -> AppResult<Store> {
        let store = self.stores.find_by_id(id).await?.ok_or_not_found()?;
        store.ensure_owned_by(user_id)?;
        Ok(store)
    }

    async fn update_store(
        &self,
        id: Uuid,
        input: StoreInput,
        photo: Option<PhotoUpload>,
        user_id: Uuid,
    ) -> AppResult<Store> {
        let mut valid = input.validate()?;
        // Reject non-owners before anything touches the upload directory
        self.get_store_for_edit(id, user_id).await?;
        if let Some(filename) = self.save_photo(photo).await? {
            valid.photo = Some(filename);
        }

        let store = self.stores.update(id, valid, user_id).await?;
        tracing::info!(store_id = %store.id, slug = %store.slug, "Store updated");
        Ok(store)
    }

    async fn tag_page(&self, tag: Option<String>) -> AppResult<TagPage> {
        let tag = tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let (tags, stores) = tokio::try_join!(
            self.stores.tags_list(),
            self.stores.list_by_tag(tag.clone())
        )?;

        Ok(TagPage { tags, tag, stores })
    }

    async fn search(&self, query: &str) -> AppResult<Vec<ScoredStore>> {
        self.stores.search_by_text(query, TEXT_SEARCH_LIMIT).await
    }

    async fn map_stores(&self, lng: f64, lat: f64) -> AppResult<Vec<StoreSummary>> {
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::validation("Coordinates are out of range"));
        }
        self.stores
            .search_near(lng, lat, NEAR_MAX_DISTANCE_METERS, NEAR_SEARCH_LIMIT)
            .await
    }

    async fn top_stores(&self) -> AppResult<Vec<TopStore>> {
        self.stores.top_rated(TOP_STORES_LIMIT).await
    }

    async fn hearted_stores(&self, user_id: Uuid) -> AppResult<Vec<Store>> {
        let user = self.users.find_by_id(user_id).await?.ok_or_not_found()?;
        if user.hearts.is_empty() {
            return Ok(Vec::new());
        }
        self.stores.find_by_ids(user.hearts).await
    }
}
