use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};
use uuid::Uuid;

use runway_core::repository::MasterTokenRepository;
use runway_core::{Clock, CoreResult, MasterToken};

const MIN_TOKEN_LEN: usize = 4;
const MAX_TOKEN_LEN: usize = 8;

/// Draws a token of 4 to 8 characters from `[A-Za-z0-9]`
pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.gen_range(MIN_TOKEN_LEN..=MAX_TOKEN_LEN);

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Single-use secrets that authorize promotion to administrator.
///
/// Duplicate values are not rejected; every stored row is one use.
pub struct MasterTokenRegistry {
    tokens: Arc<dyn MasterTokenRepository>,
    clock: Arc<dyn Clock>,
}

impl MasterTokenRegistry {
    pub fn new(tokens: Arc<dyn MasterTokenRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { tokens, clock }
    }

    pub async fn issue(&self) -> CoreResult<MasterToken> {
        let token = MasterToken {
            id: Uuid::new_v4(),
            token: generate_token(&mut rand::thread_rng()),
            created_at: self.clock.now(),
        };

        self.tokens.insert_token(&token).await?;
        info!("Issued master token {}", token.id);

        Ok(token)
    }

    /// Removes one stored copy of `token`. `false` when none was left.
    pub async fn consume(&self, token: &str) -> CoreResult<bool> {
        let consumed = self.tokens.consume_token(token).await?;
        if !consumed {
            warn!("Rejected unknown or already used master token");
        }
        Ok(consumed)
    }

    pub async fn list(&self) -> CoreResult<Vec<MasterToken>> {
        Ok(self.tokens.list_tokens().await?)
    }
}
