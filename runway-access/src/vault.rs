use std::fmt;
use std::sync::Arc;

use argon2::{
    password_hash::{self, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use runway_core::{Clock, CoreError, UserAccount};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The hasher failed or a stored hash could not be parsed
    #[error("HashError: {0}")]
    Hash(String),
    #[error("Password does not match")]
    Mismatch,
    /// Bad signature, malformed token or expired session
    #[error("Invalid session")]
    InvalidSession,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl From<VaultError> for CoreError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Mismatch | VaultError::InvalidSession => CoreError::Denied,
            VaultError::Hash(msg) | VaultError::Signing(msg) => CoreError::InternalError(msg),
        }
    }
}

// ============================================================================
// Session Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub role: bool,
    pub name: String,
    pub master_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn is_admin(&self) -> bool {
        self.role || self.master_admin
    }
}

// ============================================================================
// Keys & Cost
// ============================================================================

/// HS256 key pair derived once from the configured secret
#[derive(Clone)]
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeys(***)")
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl HashCost {
    /// Cheapest parameters argon2 accepts. Only meant for tests.
    pub const MINIMAL: HashCost = HashCost {
        memory_kib: 8,
        iterations: 1,
    };
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

// ============================================================================
// Vault
// ============================================================================

/// Hashes passwords and signs session tokens.
///
/// Cost and signing key are fixed at construction. Session expiry is measured
/// against the injected clock, so a `ManualClock` makes it deterministic.
pub struct CredentialVault {
    argon: Argon2<'static>,
    keys: SigningKeys,
    session_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialVault {
    pub fn new(
        keys: SigningKeys,
        cost: HashCost,
        session_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VaultError> {
        let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| VaultError::Hash(e.to_string()))?;

        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            keys,
            session_ttl,
            clock,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Hashes a password into a PHC string with a fresh salt
    pub fn hash(&self, password: &str) -> Result<String, VaultError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| VaultError::Hash(e.to_string()))
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<(), VaultError> {
        let stored = PasswordHash::new(hash).map_err(|e| VaultError::Hash(e.to_string()))?;

        self.argon
            .verify_password(password.as_bytes(), &stored)
            .map_err(|e| match e {
                password_hash::Error::Password => VaultError::Mismatch,
                other => VaultError::Hash(other.to_string()),
            })
    }

    pub fn issue_session(&self, account: &UserAccount) -> Result<String, VaultError> {
        let issued_at = self.clock.now();
        let claims = SessionClaims {
            sub: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            name: account.name.clone(),
            master_admin: account.master_admin,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.session_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| VaultError::Signing(e.to_string()))
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, VaultError> {
        // Expiry is checked below against our clock instead of the system time.
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<SessionClaims>(token, &self.keys.decoding, &validation)
            .map_err(|_| VaultError::InvalidSession)?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(VaultError::InvalidSession);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use runway_core::{ManualClock, NewUser};

    fn vault_with_clock(clock: Arc<ManualClock>) -> CredentialVault {
        CredentialVault::new(
            SigningKeys::from_secret(b"test-secret"),
            HashCost::MINIMAL,
            Duration::hours(72),
            clock,
        )
        .unwrap()
    }

    fn account() -> UserAccount {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
        .into_account()
    }

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let vault = vault_with_clock(Arc::new(ManualClock::new(start())));
        let hash = vault.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(vault.verify("secret1", &hash).is_ok());
        assert!(matches!(vault.verify("secret2", &hash), Err(VaultError::Mismatch)));
    }

    #[test]
    fn test_hash_uses_fresh_salt() {
        let vault = vault_with_clock(Arc::new(ManualClock::new(start())));
        assert_ne!(vault.hash("secret1").unwrap(), vault.hash("secret1").unwrap());
    }

    #[test]
    fn test_unparseable_hash_is_not_a_mismatch() {
        let vault = vault_with_clock(Arc::new(ManualClock::new(start())));
        assert!(matches!(vault.verify("secret1", "not-a-hash"), Err(VaultError::Hash(_))));
    }

    #[test]
    fn test_session_round_trip() {
        let vault = vault_with_clock(Arc::new(ManualClock::new(start())));
        let account = account();

        let token = vault.issue_session(&account).unwrap();
        let claims = vault.verify_session(&token).unwrap();

        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.username, "alice");
        assert!(!claims.role);
        assert_eq!(claims.exp - claims.iat, 72 * 60 * 60);
    }

    #[test]
    fn test_session_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let vault = vault_with_clock(clock.clone());
        let token = vault.issue_session(&account()).unwrap();

        clock.advance(Duration::hours(72) - Duration::seconds(1));
        assert!(vault.verify_session(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(vault.verify_session(&token), Err(VaultError::InvalidSession)));
    }

    #[test]
    fn test_session_signed_with_other_key_is_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let other = CredentialVault::new(
            SigningKeys::from_secret(b"other-secret"),
            HashCost::MINIMAL,
            Duration::hours(72),
            clock.clone(),
        )
        .unwrap();
        let token = other.issue_session(&account()).unwrap();

        let vault = vault_with_clock(clock);
        assert!(matches!(vault.verify_session(&token), Err(VaultError::InvalidSession)));
        assert!(matches!(vault.verify_session("garbage"), Err(VaultError::InvalidSession)));
    }

    #[test]
    fn test_vault_errors_map_to_core() {
        assert!(matches!(CoreError::from(VaultError::Mismatch), CoreError::Denied));
        assert!(matches!(
            CoreError::from(VaultError::Hash("boom".into())),
            CoreError::InternalError(_)
        ));
    }
}
