use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use runway_core::{CoreError, CoreResult, Credentials, MasterToken};

use crate::accounts::{AccountService, Session};
use crate::master_token::MasterTokenRegistry;

/// Password plus master token promotes an account to administrator
pub struct AccessControlWorkflow {
    accounts: Arc<AccountService>,
    tokens: Arc<MasterTokenRegistry>,
}

impl AccessControlWorkflow {
    pub fn new(accounts: Arc<AccountService>, tokens: Arc<MasterTokenRegistry>) -> Self {
        Self { accounts, tokens }
    }

    /// Returns a fresh session carrying the administrator role.
    ///
    /// The token is only spent once the password has been verified, so a
    /// wrong password never burns a valid token.
    pub async fn request_escalation(
        &self,
        credentials: &Credentials,
        candidate_token: &str,
    ) -> CoreResult<Session> {
        let account = self.accounts.authenticate(credentials).await?;

        if !self.tokens.consume(candidate_token).await? {
            warn!("Escalation denied for {}: invalid master token", account.username);
            return Err(CoreError::Denied);
        }

        let promoted = self.accounts.promote(account.id).await?;
        info!("Escalation granted for {}", promoted.username);

        self.accounts.session_for(&promoted)
    }

    pub async fn issue_token(&self, credentials: &Credentials) -> CoreResult<MasterToken> {
        let admin = self.accounts.authenticate_admin(credentials).await?;
        let token = self.tokens.issue().await?;
        info!("Master token {} issued by {}", token.id, admin.username);
        Ok(token)
    }

    /// Lists outstanding tokens. The caller is re-read so a revoked role is honored.
    pub async fn list_tokens(&self, caller: Uuid) -> CoreResult<Vec<MasterToken>> {
        let account = self.accounts.account(caller).await.map_err(|err| match err {
            CoreError::NotFoundError { .. } => CoreError::Denied,
            other => other,
        })?;
        if !account.is_admin() {
            return Err(CoreError::Denied);
        }
        self.tokens.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::NewAccount;
    use crate::vault::{CredentialVault, HashCost, SigningKeys};
    use chrono::Duration;
    use runway_core::{Clock, SystemClock};
    use runway_store::MemoryStore;

    struct Fixture {
        accounts: Arc<AccountService>,
        tokens: Arc<MasterTokenRegistry>,
        workflow: AccessControlWorkflow,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let repos = store.repositories();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let vault = CredentialVault::new(
            SigningKeys::from_secret(b"test-secret"),
            HashCost::MINIMAL,
            Duration::hours(72),
            clock.clone(),
        )
        .unwrap();
        let accounts = Arc::new(AccountService::new(repos.users, Arc::new(vault), clock.clone()));
        let tokens = Arc::new(MasterTokenRegistry::new(repos.tokens, clock));

        accounts
            .register(NewAccount {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                name: "Alice".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        Fixture {
            workflow: AccessControlWorkflow::new(accounts.clone(), tokens.clone()),
            accounts,
            tokens,
        }
    }

    #[tokio::test]
    async fn test_valid_token_promotes_user() {
        let fx = fixture().await;
        let token = fx.tokens.issue().await.unwrap();

        let session = fx
            .workflow
            .request_escalation(&Credentials::new("alice", "secret1"), &token.token)
            .await
            .unwrap();

        assert!(session.claims.role);
        let account = fx.accounts.account(session.claims.sub).await.unwrap();
        assert!(account.role);
        assert!(fx.tokens.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_token_is_denied_and_role_unchanged() {
        let fx = fixture().await;

        let result = fx
            .workflow
            .request_escalation(&Credentials::new("alice", "secret1"), "bogus")
            .await;
        assert!(matches!(result, Err(CoreError::Denied)));

        let account = fx.accounts.authenticate(&Credentials::new("alice", "secret1")).await.unwrap();
        assert!(!account.role);
    }

    #[tokio::test]
    async fn test_wrong_password_keeps_token() {
        let fx = fixture().await;
        let token = fx.tokens.issue().await.unwrap();

        let result = fx
            .workflow
            .request_escalation(&Credentials::new("alice", "wrong-password"), &token.token)
            .await;
        assert!(matches!(result, Err(CoreError::Denied)));

        assert_eq!(fx.tokens.list().await.unwrap(), vec![token]);
    }

    #[tokio::test]
    async fn test_token_issue_and_list_require_admin() {
        let fx = fixture().await;
        let creds = Credentials::new("alice", "secret1");

        assert!(matches!(fx.workflow.issue_token(&creds).await, Err(CoreError::Denied)));

        let seed = fx.tokens.issue().await.unwrap();
        let session = fx.workflow.request_escalation(&creds, &seed.token).await.unwrap();

        let issued = fx.workflow.issue_token(&creds).await.unwrap();
        let listed = fx.workflow.list_tokens(session.claims.sub).await.unwrap();
        assert_eq!(listed, vec![issued]);
    }
}
