use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use runway_core::repository::{MasterTokenRepository, StoreResult};
use runway_core::MasterToken;

use crate::database::read_error;

pub struct PgMasterTokenRepository {
    pool: PgPool,
}

impl PgMasterTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MasterTokenRow {
    id: Uuid,
    token: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl MasterTokenRepository for PgMasterTokenRepository {
    async fn insert_token(&self, token: &MasterToken) -> StoreResult<()> {
        sqlx::query("INSERT INTO master_tokens (id, token, created_at) VALUES ($1, $2, $3)")
            .bind(token.id)
            .bind(&token.token)
            .bind(token.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| read_error(e, "master_token"))?;

        Ok(())
    }

    async fn list_tokens(&self) -> StoreResult<Vec<MasterToken>> {
        let rows = sqlx::query_as::<_, MasterTokenRow>(
            "SELECT id, token, created_at FROM master_tokens ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error(e, "master_token"))?;

        Ok(rows
            .into_iter()
            .map(|row| MasterToken {
                id: row.id,
                token: row.token,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn consume_token(&self, token: &str) -> StoreResult<bool> {
        // Concurrent callers skip the row a winner has locked and see nothing left.
        let result = sqlx::query(
            r#"
            DELETE FROM master_tokens
            WHERE id = (
                SELECT id FROM master_tokens
                WHERE token = $1
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| read_error(e, "master_token"))?;

        Ok(result.rows_affected() == 1)
    }
}
