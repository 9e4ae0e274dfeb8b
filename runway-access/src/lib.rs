pub mod accounts;
pub mod escalation;
pub mod master_token;
pub mod vault;

pub use accounts::{AccountService, NewAccount, Session};
pub use escalation::AccessControlWorkflow;
pub use master_token::MasterTokenRegistry;
pub use vault::{CredentialVault, HashCost, SessionClaims, SigningKeys, VaultError};
