//! Review service.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::{ReviewRepository, StoreRepository};
use common::{AppResult, OptionExt};
use domain::{NewReview, Review, ReviewDetail};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Review `store_id` as `author_id`
    async fn add_review(
        &self,
        store_id: Uuid,
        author_id: Uuid,
        review: NewReview,
    ) -> AppResult<Review>;

    async fn reviews_for_store(&self, store_id: Uuid) -> AppResult<Vec<ReviewDetail>>;
}

pub struct ReviewManager {
    reviews: Arc<dyn ReviewRepository>,
    stores: Arc<dyn StoreRepository>,
}

impl ReviewManager {
    pub fn new(reviews: Arc<dyn ReviewRepository>, stores: Arc<dyn StoreRepository>) -> Self {
        Self { reviews, stores }
    }
}

#[async_trait]
impl ReviewService for ReviewManager {
    async fn add_review(
        &self,
        store_id: Uuid,
        author_id: Uuid,
        review: NewReview,
    ) -> AppResult<Review> {
        let review = review.validate()?;
        self.stores.find_by_id(store_id).await?.ok_or_not_found()?;

        let review = self.reviews.create(review, author_id, store_id).await?;
        tracing::info!(review_id = %review.id, %store_id, rating = review.rating, "Review added");
        Ok(review)
    }

    async fn reviews_for_store(&self, store_id: Uuid) -> AppResult<Vec<ReviewDetail>> {
        self.stores.find_by_id(store_id).await?.ok_or_not_found()?;
        self.reviews.find_for_store(store_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockReviewRepository, MockStoreRepository};
    use chrono::Utc;
    use common::AppError;
    use domain::{Location, Store};

    fn store(id: Uuid) -> Store {
        Store {
            id,
            name: "Bean There".into(),
            slug: "bean-there".into(),
            description: None,
            tags: vec![],
            created: Utc::now(),
            location: Location::point(0.0, 0.0, "Somewhere"),
            photo: None,
            author: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_add_review_stamps_author_and_store() {
        let store_id = Uuid::new_v4();
        let author_id = Uuid::new_v4();

        let mut stores = MockStoreRepository::new();
        stores
            .expect_find_by_id()
            .returning(|id| Ok(Some(store(id))));
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_create()
            .withf(move |review, author, store| {
                *author == author_id && *store == store_id && review.text == "Great beans"
            })
            .times(1)
            .returning(|review, author, store| {
                Ok(Review {
                    id: Uuid::new_v4(),
                    author,
                    store,
                    rating: review.rating,
                    text: review.text,
                    created: Utc::now(),
                })
            });

        let review = ReviewManager::new(Arc::new(reviews), Arc::new(stores))
            .add_review(
                store_id,
                author_id,
                NewReview {
                    rating: 4,
                    text: "  Great beans ".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(review.store, store_id);
        assert_eq!(review.rating, 4);
    }

    #[tokio::test]
    async fn test_add_review_rejects_bad_rating() {
        let mut reviews = MockReviewRepository::new();
        reviews.expect_create().never();

        let result = ReviewManager::new(Arc::new(reviews), Arc::new(MockStoreRepository::new()))
            .add_review(
                Uuid::new_v4(),
                Uuid::new_v4(),
                NewReview {
                    rating: 6,
                    text: "Too good".into(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_review_to_missing_store() {
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(|_| Ok(None));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_create().never();

        let result = ReviewManager::new(Arc::new(reviews), Arc::new(stores))
            .add_review(
                Uuid::new_v4(),
                Uuid::new_v4(),
                NewReview {
                    rating: 3,
                    text: "Fine".into(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
