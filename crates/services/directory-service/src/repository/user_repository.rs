//! User repository: accounts, reset tokens and hearts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::store_heart::{self, Entity as StoreHeartEntity};
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{NewUser, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID, hearts included
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by (normalized) email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Load several users at once (for author summaries)
    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>>;

    /// Create a new user
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Store a reset token and its expiry
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: String,
        expires: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Find the user holding `token` whose expiry is strictly after `now`
    async fn find_by_reset_token(&self, token: &str, now: DateTime<Utc>)
        -> AppResult<Option<User>>;

    /// Remove both reset fields
    async fn clear_reset_token(&self, user_id: Uuid) -> AppResult<()>;

    /// Add a store to the user's hearts (no-op if already present)
    async fn add_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<()>;

    /// Remove a store from the user's hearts (no-op if absent)
    async fn remove_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn hearts_of(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let hearts = StoreHeartEntity::find()
            .select_only()
            .column(store_heart::Column::StoreId)
            .filter(store_heart::Column::UserId.eq(user_id))
            .order_by_asc(store_heart::Column::CreatedAt)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;
        Ok(hearts)
    }

    async fn with_hearts(&self, model: Option<user::Model>) -> AppResult<Option<User>> {
        match model {
            Some(model) => {
                let hearts = self.hearts_of(model.id).await?;
                Ok(Some(model.into_domain(hearts)))
            }
            None => Ok(None),
        }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<user::Model> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        self.with_hearts(model).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        self.with_hearts(model).await
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Summaries only need the profile, not the hearts
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(|m| m.into_domain(Vec::new())).collect())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name),
            email: Set(new_user.email),
            reset_password_token: Set(None),
            reset_password_expires: Set(None),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(model.into_domain(Vec::new()))
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: String,
        expires: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut active: ActiveModel = self.find_model(user_id).await?.into();
        active.reset_password_token = Set(Some(token));
        active.reset_password_expires = Set(Some(expires));
        active.update(&self.db).await?;
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::ResetPasswordToken.eq(token))
            .filter(user::Column::ResetPasswordExpires.gt(now))
            .one(&self.db)
            .await?;
        self.with_hearts(model).await
    }

    async fn clear_reset_token(&self, user_id: Uuid) -> AppResult<()> {
        let mut active: ActiveModel = self.find_model(user_id).await?.into();
        active.reset_password_token = Set(None);
        active.reset_password_expires = Set(None);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn add_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<()> {
        let heart = store_heart::ActiveModel {
            user_id: Set(user_id),
            store_id: Set(store_id),
            created_at: Set(Utc::now()),
        };

        StoreHeartEntity::insert(heart)
            .on_conflict(
                OnConflict::columns([store_heart::Column::UserId, store_heart::Column::StoreId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn remove_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<()> {
        StoreHeartEntity::delete_many()
            .filter(store_heart::Column::UserId.eq(user_id))
            .filter(store_heart::Column::StoreId.eq(store_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
