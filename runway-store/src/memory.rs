use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use runway_core::repository::{
    FlightRepository, MasterTokenRepository, StoreResult, TicketRepository, UserRepository,
};
use runway_core::{
    FlightRecord, FlightStatus, MasterToken, NotificationRecord, Repositories, SaleEntry,
    StoreError, TicketRecord, TicketSummary, UserAccount,
};

#[derive(Default)]
struct Tables {
    flights: Vec<FlightRecord>,
    users: Vec<UserAccount>,
    tickets: Vec<TicketRecord>,
    notifications: Vec<NotificationRecord>,
    tokens: Vec<MasterToken>,
}

/// In-process store with the same constraints as the Postgres schema:
/// unique flight numbers, usernames and emails, foreign keys on tickets,
/// cascading deletes. Every operation runs under one lock, so multi-row
/// writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            flights: self.clone(),
            tickets: self.clone(),
            users: self.clone(),
            tokens: self.clone(),
        }
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn insert_flight(&self, flight: &FlightRecord) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .flights
            .iter()
            .any(|f| f.flight_number == flight.flight_number)
        {
            return Err(StoreError::Conflict {
                resource: "flight",
                field: "flight_number",
                value: flight.flight_number.clone(),
            });
        }
        tables.flights.push(flight.clone());
        Ok(())
    }

    async fn flight_by_id(&self, id: Uuid) -> StoreResult<Option<FlightRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.flights.iter().find(|f| f.id == id).cloned())
    }

    async fn flight_by_number(&self, flight_number: &str) -> StoreResult<Option<FlightRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .flights
            .iter()
            .find(|f| f.flight_number == flight_number)
            .cloned())
    }

    async fn update_flight_status(
        &self,
        id: Uuid,
        status: FlightStatus,
        changed_at: DateTime<Utc>,
    ) -> StoreResult<FlightRecord> {
        let mut tables = self.tables.write().await;
        let flight = tables
            .flights
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| StoreError::not_found("flight", id))?;

        flight.status = status;
        flight.status_changed_at = changed_at;
        Ok(flight.clone())
    }

    async fn delete_flight(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.flights.len();
        tables.flights.retain(|f| f.id != id);
        if tables.flights.len() == before {
            return Err(StoreError::not_found("flight", id));
        }

        let removed: Vec<Uuid> = tables
            .tickets
            .iter()
            .filter(|t| t.flight_id == id)
            .map(|t| t.id)
            .collect();
        tables.tickets.retain(|t| t.flight_id != id);
        tables
            .notifications
            .retain(|n| !removed.contains(&n.ticket_id));
        Ok(())
    }

    async fn list_flights(&self) -> StoreResult<Vec<FlightRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.flights.clone())
    }

    async fn list_flights_with_status(
        &self,
        status: FlightStatus,
    ) -> StoreResult<Vec<FlightRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .flights
            .iter()
            .filter(|f| f.status == status)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert_ticket_with_notification(
        &self,
        ticket: &TicketRecord,
        notification: &NotificationRecord,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.flights.iter().any(|f| f.id == ticket.flight_id) {
            return Err(StoreError::not_found("flight", ticket.flight_id));
        }
        if !tables.users.iter().any(|u| u.id == ticket.user_id) {
            return Err(StoreError::not_found("user", ticket.user_id));
        }

        tables.tickets.push(ticket.clone());
        tables.notifications.push(notification.clone());
        Ok(())
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> StoreResult<Vec<TicketSummary>> {
        let tables = self.tables.read().await;
        let summaries = tables
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter_map(|t| {
                tables
                    .flights
                    .iter()
                    .find(|f| f.id == t.flight_id)
                    .map(|f| TicketSummary {
                        flight_number: f.flight_number.clone(),
                        seat: t.seat.clone(),
                        price: t.price,
                    })
            })
            .collect();
        Ok(summaries)
    }

    async fn notifications_for_user(&self, user_id: Uuid) -> StoreResult<Vec<NotificationRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn sale_entries(&self) -> StoreResult<Vec<SaleEntry>> {
        let tables = self.tables.read().await;
        let entries = tables
            .tickets
            .iter()
            .filter_map(|t| {
                tables
                    .flights
                    .iter()
                    .find(|f| f.id == t.flight_id)
                    .map(|f| SaleEntry {
                        departure: f.departure,
                        price: t.price,
                    })
            })
            .collect();
        Ok(entries)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &UserAccount) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict {
                resource: "user",
                field: "username",
                value: user.username.clone(),
            });
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict {
                resource: "user",
                field: "email",
                value: user.email.clone(),
            });
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_user_role(&self, id: Uuid, role: bool) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        user.role = role;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(StoreError::not_found("user", id));
        }
        tables.tickets.retain(|t| t.user_id != id);
        tables.notifications.retain(|n| n.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl MasterTokenRepository for MemoryStore {
    async fn insert_token(&self, token: &MasterToken) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.tokens.push(token.clone());
        Ok(())
    }

    async fn list_tokens(&self) -> StoreResult<Vec<MasterToken>> {
        let tables = self.tables.read().await;
        Ok(tables.tokens.clone())
    }

    async fn consume_token(&self, token: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.tokens.iter().position(|t| t.token == token) {
            Some(index) => {
                tables.tokens.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
