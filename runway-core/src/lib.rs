pub mod clock;
pub mod models;
pub mod notifier;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use models::{
    Credentials, FlightRecord, FlightStatus, MasterToken, NewFlight, NewTicket, NewUser,
    NotificationRecord, SaleEntry, TicketRecord, TicketSummary, UnknownStatus, UserAccount,
};
pub use notifier::{Notifier, NotifyError};
pub use repository::{Repositories, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{resource} with {field} '{value}' already exists")]
    DuplicateError {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{resource} not found: {identifier}")]
    NotFoundError {
        resource: &'static str,
        identifier: String,
    },
    /// Authentication or authorization failed. Never carries the reason.
    #[error("Access denied")]
    Denied,
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(resource: &'static str, identifier: impl ToString) -> Self {
        Self::NotFoundError {
            resource,
            identifier: identifier.to_string(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                resource,
                field,
                value,
            } => CoreError::DuplicateError {
                resource,
                field,
                value,
            },
            StoreError::NotFound {
                resource,
                identifier,
            } => CoreError::NotFoundError {
                resource,
                identifier,
            },
            StoreError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => CoreError::InternalError(msg),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
