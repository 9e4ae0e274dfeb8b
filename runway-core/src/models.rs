use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Flight Board
// ============================================================================

/// Lifecycle of a flight on the board
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Registration,
    Boarding,
    Departed,
    Cancelled,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 4] = [
        FlightStatus::Registration,
        FlightStatus::Boarding,
        FlightStatus::Departed,
        FlightStatus::Cancelled,
    ];

    /// Storage representation, also used by the Postgres `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Registration => "REGISTRATION",
            FlightStatus::Boarding => "BOARDING",
            FlightStatus::Departed => "DEPARTED",
            FlightStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlightStatus::Departed | FlightStatus::Cancelled)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized flight status: '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for FlightStatus {
    type Err = UnknownStatus;

    /// Accepts the English names in any case and the labels written by the
    /// legacy board.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let status = match trimmed.to_lowercase().as_str() {
            "registration" | "регистрация" => FlightStatus::Registration,
            "boarding" | "посадка" => FlightStatus::Boarding,
            "departed" | "вылетел" => FlightStatus::Departed,
            "cancelled" | "canceled" | "отменён" | "отменен" => FlightStatus::Cancelled,
            _ => return Err(UnknownStatus(trimmed.to_string())),
        };
        Ok(status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightRecord {
    pub id: Uuid,
    pub flight_number: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub status: FlightStatus,
    pub status_changed_at: DateTime<Utc>,
}

impl FlightRecord {
    /// Location code: the first whitespace-delimited token of the destination
    pub fn destination_code(&self) -> Option<&str> {
        self.destination.split_whitespace().next()
    }
}

#[derive(Debug, Clone)]
pub struct NewFlight {
    pub flight_number: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewFlight {
    pub fn into_record(self) -> FlightRecord {
        FlightRecord {
            id: Uuid::new_v4(),
            flight_number: self.flight_number,
            destination: self.destination,
            departure: self.departure,
            status: FlightStatus::Registration,
            status_changed_at: self.created_at,
        }
    }
}

// ============================================================================
// Tickets
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub seat: String,
    pub price: i32,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub seat: String,
    pub price: i32,
    pub issued_at: DateTime<Utc>,
}

impl NewTicket {
    /// Builds the ticket and the notification announcing it, stamped with the same time
    pub fn into_record(self) -> (TicketRecord, NotificationRecord) {
        let ticket = TicketRecord {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            flight_id: self.flight_id,
            seat: self.seat,
            price: self.price,
            issued_at: self.issued_at,
        };
        let notification = NotificationRecord {
            id: Uuid::new_v4(),
            user_id: ticket.user_id,
            ticket_id: ticket.id,
            created_at: ticket.issued_at,
        };
        (ticket, notification)
    }
}

/// A ticket as shown to its holder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketSummary {
    pub flight_number: String,
    pub seat: String,
    pub price: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticket_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One sold ticket, keyed by its flight's departure, for sales reporting
#[derive(Debug, Clone, PartialEq)]
pub struct SaleEntry {
    pub departure: DateTime<Utc>,
    pub price: i32,
}

// ============================================================================
// Accounts & Access Control
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: bool,
    pub master_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_admin(&self) -> bool {
        self.role || self.master_admin
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_account(self) -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            role: false,
            master_admin: false,
            created_at: self.created_at,
        }
    }
}

/// Username and plaintext password supplied with a mutating request
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterToken {
    pub id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_accepts_names_and_legacy_labels() {
        assert_eq!("Boarding".parse::<FlightStatus>().unwrap(), FlightStatus::Boarding);
        assert_eq!("  DEPARTED ".parse::<FlightStatus>().unwrap(), FlightStatus::Departed);
        assert_eq!("Регистрация".parse::<FlightStatus>().unwrap(), FlightStatus::Registration);
        assert_eq!("Отменён".parse::<FlightStatus>().unwrap(), FlightStatus::Cancelled);
        assert!("Delayed".parse::<FlightStatus>().is_err());
    }

    #[test]
    fn test_status_storage_round_trip() {
        for status in FlightStatus::ALL {
            assert_eq!(status.as_str().parse::<FlightStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_destination_code_takes_first_token() {
        let flight = NewFlight {
            flight_number: "SU100".to_string(),
            destination: "Kazan Terminal B gate 4".to_string(),
            departure: Utc::now(),
            created_at: Utc::now(),
        }
        .into_record();

        assert_eq!(flight.status, FlightStatus::Registration);
        assert_eq!(flight.destination_code(), Some("Kazan"));
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let account = NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        }
        .into_account();

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!account.is_admin());
    }
}
