//! Store repository: persistence, slugs and the listing/search queries.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, Statement, Value,
};
use uuid::Uuid;

use super::entities::store::{self, ActiveModel, Entity as StoreEntity};
use super::entities::user::Entity as UserEntity;
use super::review_repository::reviews_with_authors;
use common::{AppError, AppResult, PageOutcome, PageRequest};
use domain::slug::{slugify, unique_slug};
use domain::{
    ScoredStore, Store, StoreDetail, StoreSummary, TagCount, TopStore, UserSummary, ValidStore,
    TOP_STORES_MIN_REVIEWS,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

const TEXT_SEARCH_SQL: &str = r#"
SELECT stores.*,
       ts_rank(to_tsvector('english', name || ' ' || coalesce(description, '')),
               plainto_tsquery('english', $1))::float8 AS score
FROM stores
WHERE to_tsvector('english', name || ' ' || coalesce(description, ''))
      @@ plainto_tsquery('english', $1)
ORDER BY score DESC
LIMIT $2
"#;

const NEAR_SQL: &str = r#"
SELECT * FROM (
    SELECT stores.*,
           $5 * 2 * asin(least(1.0, sqrt(
               power(sin(radians(latitude - $2) / 2), 2)
               + cos(radians($2)) * cos(radians(latitude))
                 * power(sin(radians(longitude - $1) / 2), 2)
           ))) AS distance
    FROM stores
) AS nearby
WHERE distance <= $3
ORDER BY distance ASC
LIMIT $4
"#;

const TAGS_SQL: &str = r#"
SELECT tag, COUNT(*)::int8 AS count
FROM stores, unnest(tags) AS tag
GROUP BY tag
ORDER BY count DESC, tag ASC
"#;

const TOP_RATED_SQL: &str = r#"
SELECT stores.*,
       COUNT(reviews.id)::int8 AS review_count,
       AVG(reviews.rating)::float8 AS average_rating
FROM stores
JOIN reviews ON reviews.store_id = stores.id
GROUP BY stores.id
HAVING COUNT(reviews.id) > $1
ORDER BY average_rating DESC, stores.created DESC
LIMIT $2
"#;

#[derive(Debug, FromQueryResult)]
struct TagRow {
    tag: String,
    count: i64,
}

/// Store repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Persist a validated store under a collision-free slug
    async fn create(&self, store: ValidStore, author_id: Uuid) -> AppResult<Store>;

    /// Store with its author and reviews
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<StoreDetail>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Store>>;

    /// Stores whose id is in `ids`, newest first
    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Store>>;

    /// Newest-first page, or the page to redirect to when past the end
    async fn list(&self, page: PageRequest) -> AppResult<PageOutcome<Store>>;

    /// Owner-checked update; the slug follows a changed name
    async fn update(&self, id: Uuid, patch: ValidStore, requesting_user: Uuid)
        -> AppResult<Store>;

    /// Distinct tags with store counts, most used first
    async fn tags_list(&self) -> AppResult<Vec<TagCount>>;

    /// Stores carrying `tag`, or every tagged store when `tag` is blank
    async fn list_by_tag(&self, tag: Option<String>) -> AppResult<Vec<Store>>;

    /// Full-text search over name and description
    async fn search_by_text(&self, query: &str, limit: u64) -> AppResult<Vec<ScoredStore>>;

    /// Stores within `max_distance_m` of a point, nearest first
    async fn search_near(
        &self,
        lng: f64,
        lat: f64,
        max_distance_m: f64,
        limit: u64,
    ) -> AppResult<Vec<StoreSummary>>;

    /// Best average rating among stores with more than one review
    async fn top_rated(&self, limit: u64) -> AppResult<Vec<TopStore>>;
}

/// Concrete implementation of StoreRepository
pub struct StoreStore {
    db: DatabaseConnection,
}

impl StoreStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Slug for `name`, counting existing family members except `exclude`.
    async fn unique_slug_for(&self, name: &str, exclude: Option<Uuid>) -> AppResult<String> {
        let base = slugify(name);
        if base.is_empty() {
            return unique_slug::<&str>(name, &[]).map_err(AppError::from);
        }

        let mut query = StoreEntity::find()
            .select_only()
            .column(store::Column::Slug)
            .filter(Expr::cust_with_values("slug ILIKE ?", [format!("{}%", base)]));
        if let Some(id) = exclude {
            query = query.filter(store::Column::Id.ne(id));
        }

        let candidates: Vec<String> = query.into_tuple().all(&self.db).await?;
        Ok(unique_slug(name, &candidates)?)
    }

    fn statement(sql: &str, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }
}

#[async_trait]
impl StoreRepository for StoreStore {
    async fn create(&self, store: ValidStore, author_id: Uuid) -> AppResult<Store> {
        let slug = self.unique_slug_for(&store.name, None).await?;

        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(store.name),
            slug: Set(slug),
            description: Set(store.description),
            tags: Set(store.tags),
            created: Set(chrono::Utc::now()),
            location_type: Set(store.location.kind),
            longitude: Set(store.location.coordinates[0]),
            latitude: Set(store.location.coordinates[1]),
            address: Set(store.location.address),
            photo: Set(store.photo),
            author_id: Set(author_id),
        };

        let model = active_model.insert(&self.db).await?;
        tracing::info!(store_id = %model.id, slug = %model.slug, "Store created");
        Ok(Store::from(model))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<StoreDetail>> {
        let Some((model, author)) = StoreEntity::find()
            .filter(store::Column::Slug.eq(slug))
            .find_also_related(UserEntity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let reviews = reviews_with_authors(&self.db, model.id).await?;
        Ok(Some(StoreDetail {
            store: Store::from(model),
            author: author.map(|a| UserSummary::from(&a.into_domain(Vec::new()))),
            reviews,
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Store>> {
        let model = StoreEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Store::from))
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Store>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = StoreEntity::find()
            .filter(store::Column::Id.is_in(ids))
            .order_by_desc(store::Column::Created)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Store::from).collect())
    }

    async fn list(&self, page: PageRequest) -> AppResult<PageOutcome<Store>> {
        let page_query = StoreEntity::find()
            .order_by_desc(store::Column::Created)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db);
        let count_query = StoreEntity::find().count(&self.db);

        let (models, total) = tokio::try_join!(page_query, count_query)?;
        let stores = models.into_iter().map(Store::from).collect();

        let outcome = PageOutcome::resolve(page, stores, total);
        if let PageOutcome::Redirect(target) = outcome {
            tracing::debug!(requested = page.page, redirect_to = target, "Store page past the end");
        }
        Ok(outcome)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: ValidStore,
        requesting_user: Uuid,
    ) -> AppResult<Store> {
        let model = StoreEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Store::from(model.clone()).ensure_owned_by(requesting_user)?;

        let slug = if patch.name != model.name {
            Some(self.unique_slug_for(&patch.name, Some(id)).await?)
        } else {
            None
        };

        let mut active: ActiveModel = model.into();
        active.name = Set(patch.name);
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        active.description = Set(patch.description);
        active.tags = Set(patch.tags);
        active.location_type = Set(patch.location.kind);
        active.longitude = Set(patch.location.coordinates[0]);
        active.latitude = Set(patch.location.coordinates[1]);
        active.address = Set(patch.location.address);
        if let Some(photo) = patch.photo {
            active.photo = Set(Some(photo));
        }

        let model = active.update(&self.db).await?;
        tracing::info!(store_id = %model.id, "Store updated");
        Ok(Store::from(model))
    }

    async fn tags_list(&self) -> AppResult<Vec<TagCount>> {
        let rows = TagRow::find_by_statement(Self::statement(TAGS_SQL, vec![]))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TagCount {
                tag: row.tag,
                count: row.count.max(0) as u64,
            })
            .collect())
    }

    async fn list_by_tag(&self, tag: Option<String>) -> AppResult<Vec<Store>> {
        let tag = tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        let query = StoreEntity::find().order_by_desc(store::Column::Created);
        let query = match tag {
            Some(tag) => query.filter(Expr::cust_with_values("? = ANY(tags)", [tag])),
            None => query.filter(Expr::cust("cardinality(tags) > 0")),
        };

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(Store::from).collect())
    }

    async fn search_by_text(&self, query: &str, limit: u64) -> AppResult<Vec<ScoredStore>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let statement = Self::statement(TEXT_SEARCH_SQL, vec![query.into(), (limit as i64).into()]);
        let rows = self.db.query_all(statement).await?;

        rows.iter()
            .map(|row| -> AppResult<ScoredStore> {
                let model = store::Model::from_query_result(row, "")?;
                let score: f64 = row.try_get("", "score")?;
                Ok(ScoredStore {
                    store: Store::from(model),
                    score,
                })
            })
            .collect()
    }

    async fn search_near(
        &self,
        lng: f64,
        lat: f64,
        max_distance_m: f64,
        limit: u64,
    ) -> AppResult<Vec<StoreSummary>> {
        let statement = Self::statement(
            NEAR_SQL,
            vec![
                lng.into(),
                lat.into(),
                max_distance_m.into(),
                (limit as i64).into(),
                EARTH_RADIUS_METERS.into(),
            ],
        );
        let models = store::Model::find_by_statement(statement)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|model| StoreSummary::from(Store::from(model)))
            .collect())
    }

    async fn top_rated(&self, limit: u64) -> AppResult<Vec<TopStore>> {
        let statement = Self::statement(
            TOP_RATED_SQL,
            vec![(TOP_STORES_MIN_REVIEWS as i64).into(), (limit as i64).into()],
        );
        let rows = self.db.query_all(statement).await?;

        rows.iter()
            .map(|row| -> AppResult<TopStore> {
                let model = store::Model::from_query_result(row, "")?;
                let review_count: i64 = row.try_get("", "review_count")?;
                let average_rating: f64 = row.try_get("", "average_rating")?;
                Ok(TopStore {
                    store: Store::from(model),
                    review_count: review_count.max(0) as u64,
                    average_rating,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{
        StoreInput, NEAR_MAX_DISTANCE_METERS, NEAR_SEARCH_LIMIT, TEXT_SEARCH_LIMIT,
        TOP_STORES_LIMIT,
    };
    use sea_orm::{DatabaseBackend, IntoMockRow, MockDatabase};
    use std::collections::BTreeMap;

    fn model(name: &str, slug: &str, author_id: Uuid) -> store::Model {
        store::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: Some("Espresso and pastries".into()),
            tags: vec!["Wifi".into()],
            created: Utc::now(),
            location_type: "Point".into(),
            longitude: -79.38,
            latitude: 43.65,
            address: "1 Queen St".into(),
            photo: None,
            author_id,
        }
    }

    /// A store row plus computed columns such as `score`.
    fn row_with(model: store::Model, extra: &[(&str, Value)]) -> BTreeMap<String, Value> {
        let mut row: BTreeMap<String, Value> =
            model.into_mock_row().into_column_value_tuples().collect();
        for (column, value) in extra {
            row.insert(column.to_string(), value.clone());
        }
        row
    }

    fn slug_row(slug: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("slug", Value::from(slug))])
    }

    fn valid(name: &str) -> ValidStore {
        StoreInput {
            name: name.into(),
            description: None,
            tags: vec![],
            coordinates: Some([-79.38, 43.65]),
            address: Some("1 Queen St".into()),
            photo: None,
        }
        .validate()
        .unwrap()
    }

    fn executed(db: DatabaseConnection) -> Vec<Statement> {
        db.into_transaction_log()
            .into_iter()
            .flat_map(|transaction| transaction.statements().to_vec())
            .collect()
    }

    fn bound(statement: &Statement) -> Vec<Value> {
        statement
            .values
            .as_ref()
            .map(|values| values.0.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_create_counts_only_the_slug_family() {
        let author = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![slug_row("wes"), slug_row("wes-2"), slug_row("wesley")]])
            .append_query_results([vec![model("Wes", "wes-3", author)]])
            .into_connection();

        let store = StoreStore::new(db.clone())
            .create(valid("Wes"), author)
            .await
            .unwrap();
        assert_eq!(store.slug, "wes-3");

        let log = executed(db);
        assert_eq!(log.len(), 2);
        assert!(log[0].sql.contains("slug ILIKE"));
        assert!(bound(&log[0]).contains(&Value::from("wes%")));
        assert!(log[1].sql.starts_with("INSERT"));
        assert!(bound(&log[1]).contains(&Value::from("wes-3")));
        assert!(bound(&log[1]).contains(&Value::from(author)));
    }

    #[tokio::test]
    async fn test_rename_excludes_the_store_itself_from_candidates() {
        let owner = Uuid::new_v4();
        let existing = model("Wes", "wes", owner);
        let id = existing.id;
        let mut renamed = existing.clone();
        renamed.name = "Wes Coffee".into();
        renamed.slug = "wes-coffee".into();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .append_query_results([vec![renamed]])
            .into_connection();

        let store = StoreStore::new(db.clone())
            .update(id, valid("Wes Coffee"), owner)
            .await
            .unwrap();
        assert_eq!(store.slug, "wes-coffee");

        let log = executed(db);
        assert_eq!(log.len(), 3);
        assert!(log[1].sql.contains("slug ILIKE"));
        assert!(log[1].sql.contains(r#""stores"."id" <>"#));
        assert!(bound(&log[1]).contains(&Value::from(id)));
        assert!(log[2].sql.starts_with("UPDATE"));
        assert!(bound(&log[2]).contains(&Value::from("wes-coffee")));
    }

    #[tokio::test]
    async fn test_update_keeping_the_name_skips_slug_lookup() {
        let owner = Uuid::new_v4();
        let existing = model("Wes", "wes", owner);
        let id = existing.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![existing]])
            .into_connection();

        StoreStore::new(db.clone())
            .update(id, valid("Wes"), owner)
            .await
            .unwrap();

        let log = executed(db);
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|statement| !statement.sql.contains("ILIKE")));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_writes_nothing() {
        let existing = model("Wes", "wes", Uuid::new_v4());
        let id = existing.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .into_connection();

        let result = StoreStore::new(db.clone())
            .update(id, valid("Wes Coffee"), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(executed(db).len(), 1);
    }

    #[tokio::test]
    async fn test_list_with_largest_page_redirects_to_last_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<store::Model>::new()])
            .append_query_results([vec![BTreeMap::from([("num_items", Value::BigInt(Some(6)))])]])
            .into_connection();

        let outcome = StoreStore::new(db.clone())
            .list(PageRequest::new(u64::MAX, 4))
            .await
            .unwrap();
        assert_eq!(outcome, PageOutcome::Redirect(2));

        let log = executed(db);
        assert!(bound(&log[0]).contains(&Value::BigUnsigned(Some(i64::MAX as u64))));
    }

    #[tokio::test]
    async fn test_text_search_binds_limit_and_reads_score() {
        let hit = model("Javi's Coffee", "javis-coffee", Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row_with(hit, &[("score", Value::from(0.75f64))])]])
            .into_connection();

        let results = StoreStore::new(db.clone())
            .search_by_text(" coffee ", TEXT_SEARCH_LIMIT)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].store.slug, "javis-coffee");
        assert_eq!(results[0].score, 0.75);

        let log = executed(db);
        assert!(log[0].sql.contains("ORDER BY score DESC"));
        assert_eq!(bound(&log[0]), vec![Value::from("coffee"), Value::from(5i64)]);
    }

    #[tokio::test]
    async fn test_blank_text_search_never_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let results = StoreStore::new(db.clone())
            .search_by_text("   ", TEXT_SEARCH_LIMIT)
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(executed(db).is_empty());
    }

    #[tokio::test]
    async fn test_near_search_binds_radius_and_projects_five_fields() {
        let near = model("Wes Bakery", "wes-bakery", Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row_with(near, &[("distance", Value::from(120.0f64))])]])
            .into_connection();

        let results = StoreStore::new(db.clone())
            .search_near(-79.4, 43.6, NEAR_MAX_DISTANCE_METERS, NEAR_SEARCH_LIMIT)
            .await
            .unwrap();
        assert_eq!(results[0].slug, "wes-bakery");
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 5);

        let log = executed(db);
        assert!(log[0].sql.contains("ORDER BY distance ASC"));
        assert_eq!(
            bound(&log[0]),
            vec![
                Value::from(-79.4f64),
                Value::from(43.6f64),
                Value::from(10_000.0f64),
                Value::from(10i64),
                Value::from(EARTH_RADIUS_METERS),
            ]
        );
    }

    #[tokio::test]
    async fn test_top_rated_requires_more_than_one_review() {
        let best = model("Bean There", "bean-there", Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row_with(
                best,
                &[
                    ("review_count", Value::from(3i64)),
                    ("average_rating", Value::from(4.5f64)),
                ],
            )]])
            .into_connection();

        let top = StoreStore::new(db.clone())
            .top_rated(TOP_STORES_LIMIT)
            .await
            .unwrap();
        assert_eq!(top[0].store.slug, "bean-there");
        assert_eq!(top[0].review_count, 3);
        assert_eq!(top[0].average_rating, 4.5);

        let log = executed(db);
        assert!(log[0].sql.contains("HAVING COUNT(reviews.id) > $1"));
        assert!(log[0].sql.contains("ORDER BY average_rating DESC"));
        assert_eq!(bound(&log[0]), vec![Value::from(1i64), Value::from(10i64)]);
    }

    #[tokio::test]
    async fn test_tags_list_maps_counts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                BTreeMap::from([("tag", Value::from("Wifi")), ("count", Value::from(3i64))]),
                BTreeMap::from([("tag", Value::from("Open Late")), ("count", Value::from(1i64))]),
            ]])
            .into_connection();

        let tags = StoreStore::new(db.clone()).tags_list().await.unwrap();
        assert_eq!(
            tags,
            vec![
                TagCount { tag: "Wifi".into(), count: 3 },
                TagCount { tag: "Open Late".into(), count: 1 },
            ]
        );
        assert!(executed(db)[0].sql.contains("ORDER BY count DESC, tag ASC"));
    }
}
