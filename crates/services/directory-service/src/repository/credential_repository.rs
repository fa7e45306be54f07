//! Credential repository: password hashes keyed by user id.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use super::entities::credential::{self, Entity as CredentialEntity};
use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Stored PHC hash for a user
    async fn find_hash(&self, user_id: Uuid) -> AppResult<Option<String>>;

    /// Insert or replace a user's hash
    async fn upsert(&self, user_id: Uuid, password_hash: String) -> AppResult<()>;
}

pub struct CredentialStore {
    db: DatabaseConnection,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialRepository for CredentialStore {
    async fn find_hash(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let model = CredentialEntity::find_by_id(user_id).one(&self.db).await?;
        Ok(model.map(|m| m.password_hash))
    }

    async fn upsert(&self, user_id: Uuid, password_hash: String) -> AppResult<()> {
        let active = credential::ActiveModel {
            user_id: Set(user_id),
            password_hash: Set(password_hash),
            updated_at: Set(Utc::now()),
        };

        CredentialEntity::insert(active)
            .on_conflict(
                OnConflict::column(credential::Column::UserId)
                    .update_columns([
                        credential::Column::PasswordHash,
                        credential::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }
}
