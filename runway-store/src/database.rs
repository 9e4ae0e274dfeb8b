use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use runway_core::{Repositories, StoreError};
use std::sync::Arc;

use crate::flight_repo::PgFlightRepository;
use crate::ticket_repo::PgTicketRepository;
use crate::token_repo::PgMasterTokenRepository;
use crate::user_repo::PgUserRepository;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            flights: Arc::new(PgFlightRepository::new(self.pool.clone())),
            tickets: Arc::new(PgTicketRepository::new(self.pool.clone())),
            users: Arc::new(PgUserRepository::new(self.pool.clone())),
            tokens: Arc::new(PgMasterTokenRepository::new(self.pool.clone())),
        }
    }
}

/// Maps a sqlx failure onto the store taxonomy.
///
/// `keys` pairs each unique column of the written row with the value being
/// written, so a unique violation can name the conflicting field. Constraint
/// names follow the `<table>_<column>_key` / `<table>_<column>_fkey` pattern
/// of the schema.
pub(crate) fn map_sqlx_error(
    err: sqlx::Error,
    resource: &'static str,
    keys: &[(&'static str, &str)],
) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            let (field, value) = keys
                .iter()
                .find(|(field, _)| constraint.contains(field))
                .or_else(|| keys.first())
                .map(|(field, value)| (*field, value.to_string()))
                .unwrap_or(("key", String::new()));
            StoreError::Conflict { resource, field, value }
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            let constraint = db_err.constraint().unwrap_or_default();
            let referenced = if constraint.contains("flight_id") {
                "flight"
            } else if constraint.contains("user_id") {
                "user"
            } else if constraint.contains("ticket_id") {
                "ticket"
            } else {
                resource
            };
            StoreError::NotFound {
                resource: referenced,
                identifier: constraint.to_string(),
            }
        }
        corrupt @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => StoreError::Corrupt(corrupt.to_string()),
        other => StoreError::Unavailable(other.to_string()),
    }
}

pub(crate) fn read_error(err: sqlx::Error, resource: &'static str) -> StoreError {
    map_sqlx_error(err, resource, &[])
}
