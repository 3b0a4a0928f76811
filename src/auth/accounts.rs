use actix_web::web;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::CredentialVerifier;
use crate::auth::token::SessionIssuer;
use crate::error::AppError;
use crate::models::{normalize_email, User};
use crate::store::UserStore;

/// Sign-up, log-in and identity lookup on top of the Identity Store.
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
    verifier: CredentialVerifier,
    issuer: SessionIssuer,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserStore>, verifier: CredentialVerifier, issuer: SessionIssuer) -> Self {
        Self {
            users,
            verifier,
            issuer,
        }
    }

    /// Registers a new account and returns its identifier.
    ///
    /// Fails with `Conflict` if the (normalized) email is already registered.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Account Already Exists!".into()));
        }

        let verifier = self.verifier;
        let password = password.to_string();
        let password_hash = web::block(move || verifier.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))??;

        // The store re-checks uniqueness, which covers a concurrent sign-up race.
        let user = self.users.insert(User::new(&email, password_hash)).await?;
        info!("registered user {}", user.id);
        Ok(user.id)
    }

    /// Checks the credentials and issues a session token.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let verifier = self.verifier;
        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let matches = web::block(move || verifier.compare(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))??;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issuer.issue(user.id)?;
        if let Err(e) = self.users.set_session_token(user.id, &token).await {
            warn!("could not record session token for user {}: {}", user.id, e);
        }

        info!("user {} logged in", user.id);
        Ok(token)
    }

    /// Email of the authenticated caller.
    pub async fn who_am_i(&self, user_id: Uuid) -> Result<String, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.email)
            .ok_or_else(|| AppError::Unauthenticated("Account no longer exists".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;

    fn accounts() -> (Accounts, Arc<MemoryUserStore>) {
        let users = Arc::new(MemoryUserStore::default());
        let accounts = Accounts::new(
            users.clone(),
            CredentialVerifier::new(4),
            SessionIssuer::new("accounts-test-secret", 7),
        );
        (accounts, users)
    }

    #[actix_rt::test]
    async fn test_sign_up_then_log_in() {
        let (accounts, users) = accounts();
        let id = accounts
            .sign_up("emma@jane.com", "securePa55word")
            .await
            .unwrap();

        let token = accounts
            .log_in("emma@jane.com", "securePa55word")
            .await
            .unwrap();
        let claims = SessionIssuer::new("accounts-test-secret", 7)
            .verify(&token)
            .unwrap();
        assert_eq!(claims.sub, id);

        let stored = users.find_by_id(id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "securePa55word");
        assert_eq!(stored.session_token.as_deref(), Some(token.as_str()));
        assert_eq!(accounts.who_am_i(id).await.unwrap(), "emma@jane.com");
    }

    #[actix_rt::test]
    async fn test_duplicate_sign_up_conflicts_and_keeps_first() {
        let (accounts, users) = accounts();
        let first = accounts.sign_up("emma@jane.com", "securePa55word").await.unwrap();

        let second = accounts.sign_up(" Emma@Jane.com ", "otherPassword").await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let kept = users.find_by_email("emma@jane.com").await.unwrap().unwrap();
        assert_eq!(kept.id, first);
        assert!(accounts.log_in("emma@jane.com", "securePa55word").await.is_ok());
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let (accounts, _) = accounts();
        accounts.sign_up("emma@jane.com", "securePa55word").await.unwrap();

        let wrong_secret = accounts.log_in("emma@jane.com", "Not5ecurePa55word").await;
        let unknown_email = accounts.log_in("doesnotexist@test.com", "securePa55word").await;

        assert!(matches!(wrong_secret, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
    }

    #[actix_rt::test]
    async fn test_who_am_i_for_unknown_user() {
        let (accounts, _) = accounts();
        assert!(matches!(
            accounts.who_am_i(Uuid::new_v4()).await,
            Err(AppError::Unauthenticated(_))
        ));
    }
}
