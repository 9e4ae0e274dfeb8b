use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    FlightRecord, FlightStatus, MasterToken, NotificationRecord, SaleEntry, TicketRecord,
    TicketSummary, UserAccount,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    /// A referenced row doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    /// Connection, timeout or pool failure. Safe to retry at the boundary.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A stored row could not be mapped back into a domain value
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn not_found(resource: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            resource,
            identifier: identifier.to_string(),
        }
    }
}

/// Repository trait for the flight board
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Fails with `Conflict` when the flight number is taken
    async fn insert_flight(&self, flight: &FlightRecord) -> StoreResult<()>;

    async fn flight_by_id(&self, id: Uuid) -> StoreResult<Option<FlightRecord>>;

    async fn flight_by_number(&self, flight_number: &str) -> StoreResult<Option<FlightRecord>>;

    async fn update_flight_status(
        &self,
        id: Uuid,
        status: FlightStatus,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<FlightRecord>;

    async fn delete_flight(&self, id: Uuid) -> StoreResult<()>;

    async fn list_flights(&self) -> StoreResult<Vec<FlightRecord>>;

    async fn list_flights_with_status(
        &self,
        status: FlightStatus,
    ) -> StoreResult<Vec<FlightRecord>>;
}

/// Repository trait for tickets and their notifications
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persists both rows in one atomic unit. Unknown user or flight is `NotFound`.
    async fn insert_ticket_with_notification(
        &self,
        ticket: &TicketRecord,
        notification: &NotificationRecord,
    ) -> StoreResult<()>;

    async fn tickets_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TicketSummary>>;

    async fn notifications_for_user(&self, user_id: Uuid) -> StoreResult<Vec<NotificationRecord>>;

    async fn sale_entries(&self) -> StoreResult<Vec<SaleEntry>>;
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken
    async fn insert_user(&self, user: &UserAccount) -> StoreResult<()>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>>;

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>>;

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    async fn set_user_role(&self, id: Uuid, role: bool) -> StoreResult<()>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}

/// Repository trait for administrator escalation tokens
#[async_trait]
pub trait MasterTokenRepository: Send + Sync {
    async fn insert_token(&self, token: &MasterToken) -> StoreResult<()>;

    async fn list_tokens(&self) -> StoreResult<Vec<MasterToken>>;

    /// Removes at most one row holding `token` as a single atomic statement.
    /// Returns whether a row was removed.
    async fn consume_token(&self, token: &str) -> StoreResult<bool>;
}

/// The persistence collaborator as seen by the services
#[derive(Clone)]
pub struct Repositories {
    pub flights: Arc<dyn FlightRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn MasterTokenRepository>,
}
