use std::sync::Arc;

use chrono::Duration;

use runway_access::{
    AccessControlWorkflow, AccountService, CredentialVault, HashCost, MasterTokenRegistry,
    SigningKeys, VaultError,
};
use runway_board::{FlightBoard, TransitionPolicy};
use runway_core::{Clock, Notifier, Repositories};
use runway_store::{Config, TransitionPolicyConfig};
use runway_ticketing::{SalesReport, TicketLedger};

/// Knobs the services are built with, taken from `Config`
#[derive(Clone)]
pub struct ServiceSettings {
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub hash_cost: HashCost,
    pub transition_policy: TransitionPolicy,
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            jwt_secret: config.auth.jwt_secret.clone(),
            session_ttl: Duration::seconds(config.auth.session_ttl_seconds as i64),
            hash_cost: HashCost {
                memory_kib: config.auth.hash_memory_kib,
                iterations: config.auth.hash_iterations,
            },
            transition_policy: match config.board.transition_policy {
                TransitionPolicyConfig::Permissive => TransitionPolicy::Permissive,
                TransitionPolicyConfig::Strict => TransitionPolicy::Strict,
            },
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub access: Arc<AccessControlWorkflow>,
    pub board: Arc<FlightBoard>,
    pub ledger: Arc<TicketLedger>,
    pub reports: Arc<SalesReport>,
}

impl AppState {
    pub fn build(
        repos: Repositories,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: &ServiceSettings,
    ) -> Result<Self, VaultError> {
        let vault = Arc::new(CredentialVault::new(
            SigningKeys::from_secret(settings.jwt_secret.as_bytes()),
            settings.hash_cost,
            settings.session_ttl,
            clock.clone(),
        )?);

        let accounts = Arc::new(AccountService::new(repos.users.clone(), vault, clock.clone()));
        let tokens = Arc::new(MasterTokenRegistry::new(repos.tokens.clone(), clock.clone()));

        Ok(Self {
            access: Arc::new(AccessControlWorkflow::new(accounts.clone(), tokens)),
            board: Arc::new(FlightBoard::new(
                repos.flights.clone(),
                settings.transition_policy,
                clock.clone(),
            )),
            ledger: Arc::new(TicketLedger::new(&repos, notifier, clock)),
            reports: Arc::new(SalesReport::new(repos.tickets.clone())),
            accounts,
        })
    }
}
