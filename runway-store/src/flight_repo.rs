use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use runway_core::repository::{FlightRepository, StoreResult};
use runway_core::{FlightRecord, FlightStatus, StoreError};

use crate::database::{map_sqlx_error, read_error};

pub struct PgFlightRepository {
    pool: PgPool,
}

impl PgFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    destination: String,
    departure: DateTime<Utc>,
    status: String,
    status_changed_at: DateTime<Utc>,
}

impl TryFrom<FlightRow> for FlightRecord {
    type Error = StoreError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<FlightStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(FlightRecord {
            id: row.id,
            flight_number: row.flight_number,
            destination: row.destination,
            departure: row.departure,
            status,
            status_changed_at: row.status_changed_at,
        })
    }
}

fn into_records(rows: Vec<FlightRow>) -> StoreResult<Vec<FlightRecord>> {
    rows.into_iter().map(FlightRecord::try_from).collect()
}

const SELECT_FLIGHTS: &str =
    "SELECT id, flight_number, destination, departure, status, status_changed_at FROM flights";

#[async_trait]
impl FlightRepository for PgFlightRepository {
    async fn insert_flight(&self, flight: &FlightRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flights (id, flight_number, destination, departure, status, status_changed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(&flight.destination)
        .bind(flight.departure)
        .bind(flight.status.as_str())
        .bind(flight.status_changed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "flight", &[("flight_number", flight.flight_number.as_str())]))?;

        Ok(())
    }

    async fn flight_by_id(&self, id: Uuid) -> StoreResult<Option<FlightRecord>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!("{SELECT_FLIGHTS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(e, "flight"))?;

        row.map(FlightRecord::try_from).transpose()
    }

    async fn flight_by_number(&self, flight_number: &str) -> StoreResult<Option<FlightRecord>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!("{SELECT_FLIGHTS} WHERE flight_number = $1"))
            .bind(flight_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(e, "flight"))?;

        row.map(FlightRecord::try_from).transpose()
    }

    async fn update_flight_status(
        &self,
        id: Uuid,
        status: FlightStatus,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<FlightRecord> {
        let row = sqlx::query_as::<_, FlightRow>(
            r#"
            UPDATE flights
            SET status = $1, status_changed_at = $2
            WHERE id = $3
            RETURNING id, flight_number, destination, departure, status, status_changed_at
            "#,
        )
        .bind(status.as_str())
        .bind(changed_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "flight"))?
        .ok_or_else(|| StoreError::not_found("flight", id))?;

        FlightRecord::try_from(row)
    }

    async fn delete_flight(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| read_error(e, "flight"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("flight", id));
        }
        Ok(())
    }

    async fn list_flights(&self) -> StoreResult<Vec<FlightRecord>> {
        let rows = sqlx::query_as::<_, FlightRow>(SELECT_FLIGHTS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error(e, "flight"))?;

        into_records(rows)
    }

    async fn list_flights_with_status(
        &self,
        status: FlightStatus,
    ) -> StoreResult<Vec<FlightRecord>> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!("{SELECT_FLIGHTS} WHERE status = $1"))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error(e, "flight"))?;

        into_records(rows)
    }
}
