use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use runway_core::repository::UserRepository;
use runway_core::{Clock, CoreError, CoreResult, Credentials, NewUser, UserAccount};

use crate::vault::{CredentialVault, SessionClaims, VaultError};

const MIN_PASSWORD_LEN: usize = 6;

/// Registration payload
#[derive(Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl NewAccount {
    fn validate(&self) -> CoreResult<()> {
        if self.username.trim().is_empty() {
            return Err(CoreError::validation("username must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("name must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(CoreError::validation("email must contain '@'"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// A signed session token together with the claims it carries
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: SessionClaims,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    vault: Arc<CredentialVault>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        vault: Arc<CredentialVault>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, vault, clock }
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Creates a non-admin account and signs a session for it
    pub async fn register(&self, new_account: NewAccount) -> CoreResult<Session> {
        new_account.validate()?;

        if self.users.user_by_username(&new_account.username).await?.is_some() {
            return Err(CoreError::DuplicateError {
                resource: "user",
                field: "username",
                value: new_account.username,
            });
        }
        if self.users.user_by_email(&new_account.email).await?.is_some() {
            return Err(CoreError::DuplicateError {
                resource: "user",
                field: "email",
                value: new_account.email,
            });
        }

        let password_hash = self.vault.hash(&new_account.password)?;
        let account = NewUser {
            username: new_account.username,
            email: new_account.email,
            name: new_account.name,
            password_hash,
            created_at: self.clock.now(),
        }
        .into_account();

        self.users.insert_user(&account).await?;
        info!("Registered user {} ({})", account.username, account.id);

        self.session_for(&account)
    }

    pub async fn login(&self, credentials: &Credentials) -> CoreResult<Session> {
        let account = self.authenticate(credentials).await?;
        info!("User {} logged in", account.username);
        self.session_for(&account)
    }

    /// Re-checks a caller's password against the stored hash.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, credentials: &Credentials) -> CoreResult<UserAccount> {
        let Some(account) = self.users.user_by_username(&credentials.username).await? else {
            warn!("Authentication failed: unknown user {}", credentials.username);
            return Err(CoreError::Denied);
        };

        match self.vault.verify(&credentials.password, &account.password_hash) {
            Ok(()) => Ok(account),
            Err(VaultError::Mismatch) => {
                warn!("Authentication failed: wrong password for {}", credentials.username);
                Err(CoreError::Denied)
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn authenticate_admin(&self, credentials: &Credentials) -> CoreResult<UserAccount> {
        let account = self.authenticate(credentials).await?;
        if !account.is_admin() {
            warn!("User {} is not an administrator", account.username);
            return Err(CoreError::Denied);
        }
        Ok(account)
    }

    pub async fn account(&self, id: Uuid) -> CoreResult<UserAccount> {
        self.users
            .user_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    /// Grants the administrator role and returns the updated account
    pub async fn promote(&self, id: Uuid) -> CoreResult<UserAccount> {
        self.users.set_user_role(id, true).await?;
        let account = self.account(id).await?;
        info!("User {} promoted to administrator", account.username);
        Ok(account)
    }

    pub async fn delete(&self, credentials: &Credentials) -> CoreResult<()> {
        let account = self.authenticate(credentials).await?;
        self.users.delete_user(account.id).await?;
        info!("Deleted user {} ({})", account.username, account.id);
        Ok(())
    }

    pub fn session_for(&self, account: &UserAccount) -> CoreResult<Session> {
        let token = self.vault.issue_session(account)?;
        let claims = self.vault.verify_session(&token)?;
        Ok(Session { token, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{HashCost, SigningKeys};
    use chrono::Duration;
    use runway_core::SystemClock;
    use runway_store::MemoryStore;

    fn service() -> AccountService {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let vault = CredentialVault::new(
            SigningKeys::from_secret(b"test-secret"),
            HashCost::MINIMAL,
            Duration::hours(72),
            clock.clone(),
        )
        .unwrap();
        AccountService::new(store.repositories().users, Arc::new(vault), clock)
    }

    fn alice() -> NewAccount {
        NewAccount {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let session = service.register(alice()).await.unwrap();
        assert_eq!(session.claims.username, "alice");
        assert!(!session.claims.role);

        let login = service.login(&Credentials::new("alice", "secret1")).await.unwrap();
        assert_eq!(login.claims.sub, session.claims.sub);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_and_bad_email() {
        let service = service();

        let mut short = alice();
        short.password = "12345".to_string();
        assert!(matches!(service.register(short).await, Err(CoreError::ValidationError(_))));

        let mut no_at = alice();
        no_at.email = "alice.example.com".to_string();
        assert!(matches!(service.register(no_at).await, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_and_email() {
        let service = service();
        service.register(alice()).await.unwrap();

        let mut same_email = alice();
        same_email.username = "alice2".to_string();
        let err = service.register(same_email).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateError { field: "email", .. }));

        let err = service.register(alice()).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateError { field: "username", .. }));
    }

    /// Registers 16 accounts concurrently and returns how many succeeded
    async fn register_concurrently(
        service: Arc<AccountService>,
        account: impl Fn(usize) -> NewAccount,
        field: &'static str,
    ) -> usize {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                let new_account = account(i);
                tokio::spawn(async move { service.register(new_account).await })
            })
            .collect();

        let mut registered = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => registered += 1,
                Err(CoreError::DuplicateError { field: got, .. }) => assert_eq!(got, field),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        registered
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registers_on_one_username() {
        let service = Arc::new(service());

        let registered = register_concurrently(
            service.clone(),
            |i| NewAccount {
                email: format!("alice{i}@example.com"),
                ..alice()
            },
            "username",
        )
        .await;

        assert_eq!(registered, 1);
        assert!(service.login(&Credentials::new("alice", "secret1")).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registers_on_one_email() {
        let service = Arc::new(service());

        let registered = register_concurrently(
            service.clone(),
            |i| NewAccount {
                username: format!("alice{i}"),
                ..alice()
            },
            "email",
        )
        .await;

        assert_eq!(registered, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_denied() {
        let service = service();
        service.register(alice()).await.unwrap();

        let wrong = service.authenticate(&Credentials::new("alice", "secret2")).await;
        assert!(matches!(wrong, Err(CoreError::Denied)));

        let unknown = service.authenticate(&Credentials::new("bob", "secret1")).await;
        assert!(matches!(unknown, Err(CoreError::Denied)));
    }

    #[tokio::test]
    async fn test_authenticate_admin_requires_role() {
        let service = service();
        let session = service.register(alice()).await.unwrap();
        let creds = Credentials::new("alice", "secret1");

        assert!(matches!(service.authenticate_admin(&creds).await, Err(CoreError::Denied)));

        service.promote(session.claims.sub).await.unwrap();
        assert!(service.authenticate_admin(&creds).await.unwrap().role);
    }

    #[tokio::test]
    async fn test_delete_requires_password() {
        let service = service();
        service.register(alice()).await.unwrap();

        let denied = service.delete(&Credentials::new("alice", "wrong!")).await;
        assert!(matches!(denied, Err(CoreError::Denied)));

        service.delete(&Credentials::new("alice", "secret1")).await.unwrap();
        let gone = service.login(&Credentials::new("alice", "secret1")).await;
        assert!(matches!(gone, Err(CoreError::Denied)));
    }
}
