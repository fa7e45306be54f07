//! Review repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::review::{self, ActiveModel, Entity as ReviewEntity};
use super::entities::user::Entity as UserEntity;
use common::AppResult;
use domain::{NewReview, Review, ReviewDetail, UserSummary};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Persist a review; author and store come from trusted context, never the body
    async fn create(&self, review: NewReview, author_id: Uuid, store_id: Uuid)
        -> AppResult<Review>;

    /// Reviews of a store, newest first, with author summaries
    async fn find_for_store(&self, store_id: Uuid) -> AppResult<Vec<ReviewDetail>>;
}

/// Reviews of `store_id` joined with their authors.
pub(crate) async fn reviews_with_authors<C: ConnectionTrait>(
    db: &C,
    store_id: Uuid,
) -> AppResult<Vec<ReviewDetail>> {
    let rows = ReviewEntity::find()
        .filter(review::Column::StoreId.eq(store_id))
        .order_by_desc(review::Column::Created)
        .find_also_related(UserEntity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(review, author)| ReviewDetail {
            review: Review::from(review),
            author_profile: author.map(|a| UserSummary::from(&a.into_domain(Vec::new()))),
        })
        .collect())
}

pub struct ReviewStore {
    db: DatabaseConnection,
}

impl ReviewStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for ReviewStore {
    async fn create(
        &self,
        review: NewReview,
        author_id: Uuid,
        store_id: Uuid,
    ) -> AppResult<Review> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id),
            store_id: Set(store_id),
            rating: Set(review.rating),
            text: Set(review.text),
            created: Set(Utc::now()),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Review::from(model))
    }

    async fn find_for_store(&self, store_id: Uuid) -> AppResult<Vec<ReviewDetail>> {
        reviews_with_authors(&self.db, store_id).await
    }
}
