use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::info;
use uuid::Uuid;

use runway_core::repository::FlightRepository;
use runway_core::{Clock, CoreError, CoreResult, FlightRecord, FlightStatus, NewFlight};

use crate::transitions::TransitionPolicy;

pub const DEPARTURE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flight numbers are 3 to 6 ASCII letters or digits
pub fn validate_flight_number(flight_number: &str) -> CoreResult<()> {
    let len = flight_number.len();
    if !(3..=6).contains(&len) || !flight_number.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::validation(format!(
            "Invalid flight number '{flight_number}': expected 3-6 letters or digits"
        )));
    }
    Ok(())
}

/// Parses `YYYY-MM-DD HH:MM:SS` as UTC
pub fn parse_departure(raw: &str) -> CoreResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), DEPARTURE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            CoreError::validation(format!(
                "Invalid departure '{raw}': expected YYYY-MM-DD HH:MM:SS"
            ))
        })
}

/// Lifecycle of flights on the departure board
pub struct FlightBoard {
    flights: Arc<dyn FlightRepository>,
    policy: TransitionPolicy,
    clock: Arc<dyn Clock>,
}

impl FlightBoard {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        policy: TransitionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            flights,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Puts a new flight on the board in `REGISTRATION`
    pub async fn create(
        &self,
        flight_number: &str,
        destination: &str,
        departure: &str,
    ) -> CoreResult<FlightRecord> {
        validate_flight_number(flight_number)?;
        let departure = parse_departure(departure)?;
        if destination.trim().is_empty() {
            return Err(CoreError::validation("destination must not be empty"));
        }

        // Early exit only; the unique constraint decides races.
        if self.flights.flight_by_number(flight_number).await?.is_some() {
            return Err(CoreError::DuplicateError {
                resource: "flight",
                field: "flight_number",
                value: flight_number.to_string(),
            });
        }

        let flight = NewFlight {
            flight_number: flight_number.to_string(),
            destination: destination.trim().to_string(),
            departure,
            created_at: self.clock.now(),
        }
        .into_record();

        self.flights.insert_flight(&flight).await?;
        info!("Flight {} ({}) added to the board", flight.flight_number, flight.id);

        Ok(flight)
    }

    /// Moves a flight to the status named by `raw_status`
    pub async fn change_status(
        &self,
        flight_id: Uuid,
        raw_status: &str,
    ) -> CoreResult<FlightRecord> {
        let status: FlightStatus = raw_status
            .parse()
            .map_err(|e: runway_core::UnknownStatus| CoreError::validation(e.to_string()))?;

        let current = self.get(flight_id).await?;
        self.policy.check(current.status, status)?;

        let updated = self
            .flights
            .update_flight_status(flight_id, status, self.clock.now())
            .await?;
        info!(
            "Flight {} status {} -> {}",
            updated.flight_number, current.status, updated.status
        );

        Ok(updated)
    }

    pub async fn delete(&self, flight_id: Uuid) -> CoreResult<()> {
        self.flights.delete_flight(flight_id).await?;
        info!("Flight {} removed from the board", flight_id);
        Ok(())
    }

    pub async fn get(&self, flight_id: Uuid) -> CoreResult<FlightRecord> {
        self.flights
            .flight_by_id(flight_id)
            .await?
            .ok_or_else(|| CoreError::not_found("flight", flight_id))
    }

    pub async fn list_board(&self) -> CoreResult<Vec<FlightRecord>> {
        Ok(self.flights.list_flights().await?)
    }

    /// Location codes of every flight still open for registration
    pub async fn list_open_destinations(&self) -> CoreResult<Vec<String>> {
        let open = self
            .flights
            .list_flights_with_status(FlightStatus::Registration)
            .await?;

        Ok(open
            .iter()
            .filter_map(|flight| flight.destination_code().map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use runway_core::repository::StoreResult;
    use runway_core::{ManualClock, SystemClock};
    use runway_store::MemoryStore;

    /// Delegates to a real store but never finds a flight by number
    struct StaleLookup(Arc<dyn FlightRepository>);

    #[async_trait]
    impl FlightRepository for StaleLookup {
        async fn insert_flight(&self, flight: &FlightRecord) -> StoreResult<()> {
            self.0.insert_flight(flight).await
        }

        async fn flight_by_id(&self, id: Uuid) -> StoreResult<Option<FlightRecord>> {
            self.0.flight_by_id(id).await
        }

        async fn flight_by_number(&self, _flight_number: &str) -> StoreResult<Option<FlightRecord>> {
            Ok(None)
        }

        async fn update_flight_status(
            &self,
            id: Uuid,
            status: FlightStatus,
            changed_at: DateTime<Utc>,
        ) -> StoreResult<FlightRecord> {
            self.0.update_flight_status(id, status, changed_at).await
        }

        async fn delete_flight(&self, id: Uuid) -> StoreResult<()> {
            self.0.delete_flight(id).await
        }

        async fn list_flights(&self) -> StoreResult<Vec<FlightRecord>> {
            self.0.list_flights().await
        }

        async fn list_flights_with_status(
            &self,
            status: FlightStatus,
        ) -> StoreResult<Vec<FlightRecord>> {
            self.0.list_flights_with_status(status).await
        }
    }

    fn board_with(policy: TransitionPolicy) -> (FlightBoard, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2029, 12, 1, 9, 0, 0).unwrap()));
        let board = FlightBoard::new(store.repositories().flights, policy, clock.clone());
        (board, clock)
    }

    #[test]
    fn test_flight_number_format() {
        for valid in ["AB1", "AB12", "SU100", "AB1234"] {
            assert!(validate_flight_number(valid).is_ok(), "{valid}");
        }
        for invalid in ["", "AB", "AB12345", "AB-12", "АБ12"] {
            assert!(validate_flight_number(invalid).is_err(), "{invalid}");
        }
    }

    #[test]
    fn test_departure_parsing() {
        let parsed = parse_departure("2030-01-01 10:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap());
        assert!(parse_departure("2030-01-01T10:00:00").is_err());
        assert!(parse_departure("tomorrow").is_err());
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let (board, _) = board_with(TransitionPolicy::Permissive);

        let flight = board.create("AB1234", "Paris CDG T2", "2030-01-01 10:00:00").await.unwrap();
        assert_eq!(flight.status, FlightStatus::Registration);

        let err = board.create("AB1234", "Rome", "2030-01-02 10:00:00").await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateError { field: "flight_number", .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (board, _) = board_with(TransitionPolicy::Permissive);

        let bad_number = board.create("A!", "Paris", "2030-01-01 10:00:00").await;
        assert!(matches!(bad_number, Err(CoreError::ValidationError(_))));

        let bad_time = board.create("AB1234", "Paris", "01.01.2030 10:00").await;
        assert!(matches!(bad_time, Err(CoreError::ValidationError(_))));

        let blank = board.create("AB1234", "   ", "2030-01-01 10:00:00").await;
        assert!(matches!(blank, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_change_status_refreshes_timestamp() {
        let (board, clock) = board_with(TransitionPolicy::Permissive);
        let flight = board.create("AB1234", "Paris", "2030-01-01 10:00:00").await.unwrap();

        clock.advance(Duration::minutes(5));
        board.change_status(flight.id, "boarding").await.unwrap();

        let listed = board.list_board().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, FlightStatus::Boarding);
        assert!(listed[0].status_changed_at > flight.status_changed_at);
    }

    #[tokio::test]
    async fn test_change_status_rejects_unknown_status_and_flight() {
        let (board, _) = board_with(TransitionPolicy::Permissive);
        let flight = board.create("AB1234", "Paris", "2030-01-01 10:00:00").await.unwrap();

        let unknown = board.change_status(flight.id, "Delayed").await;
        assert!(matches!(unknown, Err(CoreError::ValidationError(_))));

        let missing = board.change_status(Uuid::new_v4(), "Boarding").await;
        assert!(matches!(missing, Err(CoreError::NotFoundError { .. })));
    }

    #[tokio::test]
    async fn test_strict_policy_blocks_skipping_boarding() {
        let (board, _) = board_with(TransitionPolicy::Strict);
        let flight = board.create("AB1234", "Paris", "2030-01-01 10:00:00").await.unwrap();

        let skipped = board.change_status(flight.id, "Departed").await;
        assert!(matches!(skipped, Err(CoreError::ValidationError(_))));
        assert_eq!(board.get(flight.id).await.unwrap().status, FlightStatus::Registration);

        board.change_status(flight.id, "Boarding").await.unwrap();
        board.change_status(flight.id, "Departed").await.unwrap();
    }

    #[tokio::test]
    async fn test_open_destinations_use_first_token() {
        let (board, _) = board_with(TransitionPolicy::Permissive);
        board.create("AB1234", "Paris CDG T2", "2030-01-01 10:00:00").await.unwrap();
        let rome = board.create("SU100", "Rome FCO", "2030-01-01 12:00:00").await.unwrap();
        board.change_status(rome.id, "Cancelled").await.unwrap();

        assert_eq!(board.list_open_destinations().await.unwrap(), vec!["Paris".to_string()]);
    }

    #[tokio::test]
    async fn test_store_constraint_catches_missed_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let flights = Arc::new(StaleLookup(store.repositories().flights));
        let board = FlightBoard::new(flights, TransitionPolicy::Permissive, Arc::new(SystemClock));

        board.create("AB1234", "Paris", "2030-01-01 10:00:00").await.unwrap();
        let err = board.create("AB1234", "Rome", "2030-01-02 10:00:00").await.unwrap_err();

        assert!(matches!(err, CoreError::DuplicateError { field: "flight_number", .. }));
        assert_eq!(board.list_board().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_on_one_number() {
        let (board, _) = board_with(TransitionPolicy::Permissive);
        let board = Arc::new(board);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let board = board.clone();
                tokio::spawn(async move {
                    board.create("AB1234", "Paris CDG", "2030-01-01 10:00:00").await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(
                    matches!(err, CoreError::DuplicateError { field: "flight_number", .. }),
                    "{err}"
                ),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(board.list_board().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_flight_is_not_found() {
        let (board, _) = board_with(TransitionPolicy::Permissive);
        let flight = board.create("AB1234", "Paris", "2030-01-01 10:00:00").await.unwrap();

        board.delete(flight.id).await.unwrap();
        assert!(board.list_board().await.unwrap().is_empty());
        assert!(matches!(board.delete(flight.id).await, Err(CoreError::NotFoundError { .. })));
    }
}
