//! Account service - password reset lifecycle, hearts and profile lookup.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::auth_service::{AuthService, AuthSession};
use crate::infra::mailer::{Mailer, OutgoingMail, PASSWORD_RESET_TEMPLATE};
use crate::repository::{StoreRepository, UserRepository};
use common::{AppError, AppResult, OptionExt};
use domain::user::normalize_email;
use domain::{DomainError, User, UserResponse, RESET_TOKEN_BYTES, RESET_TOKEN_TTL_SECONDS};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// What happened to a password reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    /// No account uses that email; nothing was written
    UnknownEmail,
    /// Token stored and reset mail sent
    Emailed,
    /// Token stored but the mail could not be delivered
    EmailFailed,
}

/// Fresh reset token: random bytes, hex encoded.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Link mailed to the user for a reset token.
pub fn reset_url(host: &str, token: &str) -> String {
    format!("http://{}/account/reset/{}", host, token)
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Store a reset token for `email` and mail the link
    async fn request_password_reset(&self, email: &str, host: &str)
        -> AppResult<ResetRequestOutcome>;

    /// User holding an unexpired `token`
    async fn validate_reset_token(&self, token: &str) -> AppResult<User>;

    /// Set a new password through a reset token and start a session
    async fn complete_reset(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<AuthSession>;

    /// Heart the store, or un-heart it when already hearted
    async fn toggle_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<User>;

    async fn get_user(&self, user_id: Uuid) -> AppResult<User>;
}

pub struct AccountManager {
    users: Arc<dyn UserRepository>,
    stores: Arc<dyn StoreRepository>,
    auth: Arc<dyn AuthService>,
    mailer: Arc<dyn Mailer>,
}

impl AccountManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stores: Arc<dyn StoreRepository>,
        auth: Arc<dyn AuthService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            stores,
            auth,
            mailer,
        }
    }
}

#[async_trait]
impl AccountService for AccountManager {
    async fn request_password_reset(
        &self,
        email: &str,
        host: &str,
    ) -> AppResult<ResetRequestOutcome> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Ok(ResetRequestOutcome::UnknownEmail);
        };

        let token = generate_reset_token();
        let expires = Utc::now() + Duration::seconds(RESET_TOKEN_TTL_SECONDS);
        self.users
            .set_reset_token(user.id, token.clone(), expires)
            .await?;

        let mail = OutgoingMail {
            recipient: user.email.clone(),
            subject: "Password Reset".to_string(),
            template_name: PASSWORD_RESET_TEMPLATE.to_string(),
            template_data: json!({
                "name": user.name,
                "reset_url": reset_url(host, &token),
            }),
        };

        match self.mailer.send(mail).await {
            Ok(()) => Ok(ResetRequestOutcome::Emailed),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Password reset mail failed");
                Ok(ResetRequestOutcome::EmailFailed)
            }
        }
    }

    async fn validate_reset_token(&self, token: &str) -> AppResult<User> {
        self.users
            .find_by_reset_token(token, Utc::now())
            .await?
            .ok_or(AppError::TokenInvalidOrExpired)
    }

    async fn complete_reset(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<AuthSession> {
        if new_password != confirm_password {
            return Err(DomainError::PasswordMismatch.into());
        }
        let mut user = self.validate_reset_token(token).await?;

        self.auth.set_password(user.id, new_password).await?;
        self.users.clear_reset_token(user.id).await?;
        user.reset_password_token = None;
        user.reset_password_expires = None;
        tracing::info!(user_id = %user.id, "Password reset completed");

        let token = self.auth.issue_token(&user)?;
        Ok(AuthSession {
            token,
            user: UserResponse::from(user),
        })
    }

    async fn toggle_heart(&self, user_id: Uuid, store_id: Uuid) -> AppResult<User> {
        self.stores.find_by_id(store_id).await?.ok_or_not_found()?;
        let user = self.get_user(user_id).await?;

        if user.has_heart(store_id) {
            self.users.remove_heart(user_id, store_id).await?;
        } else {
            self.users.add_heart(user_id, store_id).await?;
        }

        self.get_user(user_id).await
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        self.users.find_by_id(user_id).await?.ok_or_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MockMailer;
    use crate::repository::{MockStoreRepository, MockUserRepository};
    use crate::service::auth_service::{MockAuthService, TokenResponse};
    use domain::{Location, Store};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Wes".into(),
            email: "wes@example.com".into(),
            reset_password_token: None,
            reset_password_expires: None,
            hearts: vec![],
            created_at: Utc::now(),
        }
    }

    fn test_store(id: Uuid) -> Store {
        Store {
            id,
            name: "Javi's Coffee".into(),
            slug: "javis-coffee".into(),
            description: None,
            tags: vec![],
            created: Utc::now(),
            location: Location::point(-79.38, 43.65, "1 Queen St"),
            photo: None,
            author: Uuid::new_v4(),
        }
    }

    fn token_response() -> TokenResponse {
        TokenResponse {
            access_token: "jwt".into(),
            token_type: "Bearer".into(),
            expires_in: 86400,
        }
    }

    fn manager(
        users: MockUserRepository,
        stores: MockStoreRepository,
        auth: MockAuthService,
        mailer: MockMailer,
    ) -> AccountManager {
        AccountManager::new(Arc::new(users), Arc::new(stores), Arc::new(auth), Arc::new(mailer))
    }

    #[test]
    fn test_reset_token_is_forty_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }

    #[tokio::test]
    async fn test_reset_request_unknown_email_writes_nothing() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "missing@x.com")
            .returning(|_| Ok(None));
        users.expect_set_reset_token().never();

        let mut mailer = MockMailer::new();
        mailer.expect_send().never();

        let outcome = manager(users, MockStoreRepository::new(), MockAuthService::new(), mailer)
            .request_password_reset(" Missing@X.com ", "localhost:7777")
            .await
            .unwrap();
        assert_eq!(outcome, ResetRequestOutcome::UnknownEmail);
    }

    #[tokio::test]
    async fn test_reset_request_persists_then_mails_link() {
        let user = test_user();
        let user_id = user.id;
        let mut seq = Sequence::new();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_set_reset_token()
            .withf(move |id, token, expires| {
                let ttl = *expires - Utc::now();
                *id == user_id
                    && token.len() == 40
                    && ttl > Duration::seconds(3590)
                    && ttl <= Duration::seconds(3600)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|mail| {
                let url = mail.template_data["reset_url"].as_str().unwrap_or_default();
                mail.recipient == "wes@example.com"
                    && mail.subject == "Password Reset"
                    && url.starts_with("http://localhost:7777/account/reset/")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let outcome = manager(users, MockStoreRepository::new(), MockAuthService::new(), mailer)
            .request_password_reset("wes@example.com", "localhost:7777")
            .await
            .unwrap();
        assert_eq!(outcome, ResetRequestOutcome::Emailed);
    }

    #[tokio::test]
    async fn test_reset_request_mail_failure_keeps_token() {
        let user = test_user();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_set_reset_token()
            .times(1)
            .returning(|_, _, _| Ok(()));
        users.expect_clear_reset_token().never();

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(AppError::internal("smtp down")));

        let outcome = manager(users, MockStoreRepository::new(), MockAuthService::new(), mailer)
            .request_password_reset("wes@example.com", "localhost")
            .await
            .unwrap();
        assert_eq!(outcome, ResetRequestOutcome::EmailFailed);
    }

    #[tokio::test]
    async fn test_validate_reset_token_rejects_unknown_or_expired() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_reset_token()
            .returning(|_, _| Ok(None));

        let result = manager(users, MockStoreRepository::new(), MockAuthService::new(), MockMailer::new())
            .validate_reset_token("expired")
            .await;
        assert!(matches!(result, Err(AppError::TokenInvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_complete_reset_checks_mismatch_before_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_reset_token().never();

        let result = manager(users, MockStoreRepository::new(), MockAuthService::new(), MockMailer::new())
            .complete_reset("token", "new-password", "other-password")
            .await;
        assert!(matches!(result, Err(AppError::PasswordMismatch)));
    }

    #[tokio::test]
    async fn test_complete_reset_with_expired_token_short_circuits() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_reset_token()
            .returning(|_, _| Ok(None));
        users.expect_clear_reset_token().never();

        let mut auth = MockAuthService::new();
        auth.expect_set_password().never();

        let result = manager(users, MockStoreRepository::new(), auth, MockMailer::new())
            .complete_reset("expired", "a", "a")
            .await;
        assert!(matches!(result, Err(AppError::TokenInvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_complete_reset_sets_password_and_clears_token() {
        let mut user = test_user();
        user.reset_password_token = Some("tok".into());
        user.reset_password_expires = Some(Utc::now() + Duration::minutes(30));
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_reset_token()
            .withf(|token, _| token == "tok")
            .returning(move |_, _| Ok(Some(user.clone())));
        users
            .expect_clear_reset_token()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(()));

        let mut auth = MockAuthService::new();
        auth.expect_set_password()
            .withf(move |id, password| *id == user_id && password == "new-password")
            .times(1)
            .returning(|_, _| Ok(()));
        auth.expect_issue_token()
            .withf(|user| user.reset_password_token.is_none())
            .returning(|_| Ok(token_response()));

        let session = manager(users, MockStoreRepository::new(), auth, MockMailer::new())
            .complete_reset("tok", "new-password", "new-password")
            .await
            .unwrap();
        assert_eq!(session.user.id, user_id);
        assert_eq!(session.token.access_token, "jwt");
    }

    #[tokio::test]
    async fn test_toggle_heart_adds_then_removes() {
        let store_id = Uuid::new_v4();
        let user = test_user();
        let user_id = user.id;
        let mut hearted = user.clone();
        hearted.hearts = vec![store_id];

        let mut stores = MockStoreRepository::new();
        stores
            .expect_find_by_id()
            .with(eq(store_id))
            .returning(move |id| Ok(Some(test_store(id))));

        let mut seq = Sequence::new();
        let mut users = MockUserRepository::new();
        let (before, after) = (user.clone(), hearted.clone());
        users
            .expect_find_by_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(before.clone())));
        users
            .expect_add_heart()
            .with(eq(user_id), eq(store_id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        users
            .expect_find_by_id()
            .times(2)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(after.clone())));
        users
            .expect_remove_heart()
            .with(eq(user_id), eq(store_id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        users
            .expect_find_by_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(user.clone())));

        let accounts = manager(users, stores, MockAuthService::new(), MockMailer::new());
        let first = accounts.toggle_heart(user_id, store_id).await.unwrap();
        assert!(first.has_heart(store_id));
        let second = accounts.toggle_heart(user_id, store_id).await.unwrap();
        assert!(!second.has_heart(store_id));
    }

    #[tokio::test]
    async fn test_toggle_heart_requires_existing_store() {
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(|_| Ok(None));
        let mut users = MockUserRepository::new();
        users.expect_add_heart().never();

        let result = manager(users, stores, MockAuthService::new(), MockMailer::new())
            .toggle_heart(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let result = manager(users, MockStoreRepository::new(), MockAuthService::new(), MockMailer::new())
            .get_user(Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
