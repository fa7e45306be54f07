//! Password reset flow against in-memory repositories.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use common::{AppError, AppResult, JwtConfig, PageOutcome, PageRequest};
use directory_service_lib::infra::{Mailer, OutgoingMail};
use directory_service_lib::repository::{CredentialRepository, StoreRepository, UserRepository};
use directory_service_lib::service::{
    AccountManager, AccountService, AuthService, Authenticator, Registration, ResetRequestOutcome,
};
use domain::{
    NewUser, ScoredStore, Store, StoreDetail, StoreSummary, TagCount, TopStore, User, ValidStore,
};

#[derive(Default)]
struct MemoryUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            reset_password_token: None,
            reset_password_expires: None,
            hearts: vec![],
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: String,
        expires: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.reset_password_token = Some(token);
        user.reset_password_expires = Some(expires);
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.reset_password_token.as_deref() == Some(token) && u.reset_token_valid_at(now))
            .cloned())
    }

    async fn clear_reset_token(&self, user_id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.reset_password_token = None;
        user.reset_password_expires = None;
        Ok(())
    }

    async fn add_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        if !user.hearts.contains(&store_id) {
            user.hearts.push(store_id);
        }
        Ok(())
    }

    async fn remove_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.hearts.retain(|id| *id != store_id);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryCredentials {
    hashes: Mutex<HashMap<Uuid, String>>,
}

#[async_trait]
impl CredentialRepository for MemoryCredentials {
    async fn find_hash(&self, user_id: Uuid) -> AppResult<Option<String>> {
        Ok(self.hashes.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, password_hash: String) -> AppResult<()> {
        self.hashes.lock().unwrap().insert(user_id, password_hash);
        Ok(())
    }
}

/// The reset flow never touches stores.
struct NoStores;

#[async_trait]
impl StoreRepository for NoStores {
    async fn create(&self, _store: ValidStore, _author_id: Uuid) -> AppResult<Store> {
        Err(AppError::internal("read-only"))
    }

    async fn find_by_slug(&self, _slug: &str) -> AppResult<Option<StoreDetail>> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<Store>> {
        Ok(None)
    }

    async fn find_by_ids(&self, _ids: Vec<Uuid>) -> AppResult<Vec<Store>> {
        Ok(vec![])
    }

    async fn list(&self, page: PageRequest) -> AppResult<PageOutcome<Store>> {
        Ok(PageOutcome::resolve(page, vec![], 0))
    }

    async fn update(&self, _id: Uuid, _patch: ValidStore, _user: Uuid) -> AppResult<Store> {
        Err(AppError::NotFound)
    }

    async fn tags_list(&self) -> AppResult<Vec<TagCount>> {
        Ok(vec![])
    }

    async fn list_by_tag(&self, _tag: Option<String>) -> AppResult<Vec<Store>> {
        Ok(vec![])
    }

    async fn search_by_text(&self, _query: &str, _limit: u64) -> AppResult<Vec<ScoredStore>> {
        Ok(vec![])
    }

    async fn search_near(
        &self,
        _lng: f64,
        _lat: f64,
        _max_distance_m: f64,
        _limit: u64,
    ) -> AppResult<Vec<StoreSummary>> {
        Ok(vec![])
    }

    async fn top_rated(&self, _limit: u64) -> AppResult<Vec<TopStore>> {
        Ok(vec![])
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

struct Harness {
    users: Arc<MemoryUsers>,
    outbox: Arc<Outbox>,
    auth: Arc<Authenticator>,
    accounts: AccountManager,
}

fn harness() -> Harness {
    let users = Arc::new(MemoryUsers::default());
    let outbox = Arc::new(Outbox::default());
    let auth = Arc::new(Authenticator::new(
        users.clone(),
        Arc::new(MemoryCredentials::default()),
        JwtConfig::default(),
    ));
    let accounts = AccountManager::new(users.clone(), Arc::new(NoStores), auth.clone(), outbox.clone());

    Harness {
        users,
        outbox,
        auth,
        accounts,
    }
}

async fn register(h: &Harness) -> User {
    let session = h
        .auth
        .register(Registration {
            name: "Wes".into(),
            email: "wes@example.com".into(),
            password: "old-password".into(),
            password_confirm: "old-password".into(),
        })
        .await
        .unwrap();
    h.users.find_by_id(session.user.id).await.unwrap().unwrap()
}

fn token_from_last_mail(h: &Harness) -> String {
    let sent = h.outbox.sent.lock().unwrap();
    let url = sent.last().unwrap().template_data["reset_url"]
        .as_str()
        .unwrap()
        .to_string();
    url.rsplit('/').next().unwrap().to_string()
}

#[tokio::test]
async fn test_full_password_reset() {
    let h = harness();
    let user = register(&h).await;

    let outcome = h
        .accounts
        .request_password_reset("WES@example.com", "localhost:7777")
        .await
        .unwrap();
    assert_eq!(outcome, ResetRequestOutcome::Emailed);

    let token = token_from_last_mail(&h);
    assert_eq!(token.len(), 40);
    assert_eq!(h.accounts.validate_reset_token(&token).await.unwrap().id, user.id);

    let session = h
        .accounts
        .complete_reset(&token, "new-password", "new-password")
        .await
        .unwrap();
    assert_eq!(session.user.id, user.id);

    assert!(h.auth.login("wes@example.com", "new-password").await.is_ok());
    assert!(matches!(
        h.auth.login("wes@example.com", "old-password").await,
        Err(AppError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let h = harness();
    register(&h).await;
    h.accounts
        .request_password_reset("wes@example.com", "localhost")
        .await
        .unwrap();
    let token = token_from_last_mail(&h);

    h.accounts
        .complete_reset(&token, "new-password", "new-password")
        .await
        .unwrap();
    let again = h
        .accounts
        .complete_reset(&token, "other-password", "other-password")
        .await;
    assert!(matches!(again, Err(AppError::TokenInvalidOrExpired)));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let h = harness();
    let user = register(&h).await;
    h.users
        .set_reset_token(user.id, "stale".into(), Utc::now() - chrono::Duration::seconds(1))
        .await
        .unwrap();

    let result = h.accounts.complete_reset("stale", "a", "a").await;
    assert!(matches!(result, Err(AppError::TokenInvalidOrExpired)));
}

#[tokio::test]
async fn test_unknown_email_sends_nothing() {
    let h = harness();
    register(&h).await;

    let outcome = h
        .accounts
        .request_password_reset("missing@x.com", "localhost")
        .await
        .unwrap();
    assert_eq!(outcome, ResetRequestOutcome::UnknownEmail);
    assert!(h.outbox.sent.lock().unwrap().is_empty());
}
