use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use runway_core::repository::{FlightRepository, TicketRepository, UserRepository};
use runway_core::{
    Clock, CoreError, CoreResult, NewTicket, NotificationRecord, Notifier, Repositories,
    TicketRecord, TicketSummary,
};

use crate::allocation::{draw_price, draw_seat};

/// Issues tickets and answers "what did I buy" queries.
///
/// Seats are drawn at random and never checked against earlier sales, so two
/// tickets on one flight may share a seat.
pub struct TicketLedger {
    flights: Arc<dyn FlightRepository>,
    users: Arc<dyn UserRepository>,
    tickets: Arc<dyn TicketRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl TicketLedger {
    pub fn new(repos: &Repositories, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            flights: repos.flights.clone(),
            users: repos.users.clone(),
            tickets: repos.tickets.clone(),
            notifier,
            clock,
        }
    }

    pub async fn issue(&self, user_id: Uuid, flight_id: Uuid) -> CoreResult<TicketRecord> {
        if self.flights.flight_by_id(flight_id).await?.is_none() {
            return Err(CoreError::not_found("flight", flight_id));
        }
        if self.users.user_by_id(user_id).await?.is_none() {
            return Err(CoreError::not_found("user", user_id));
        }

        let (seat, price) = {
            let mut rng = rand::thread_rng();
            (draw_seat(&mut rng), draw_price(&mut rng))
        };

        let (ticket, notification) = NewTicket {
            user_id,
            flight_id,
            seat,
            price,
            issued_at: self.clock.now(),
        }
        .into_record();

        self.tickets
            .insert_ticket_with_notification(&ticket, &notification)
            .await?;
        info!(
            "Issued ticket {} seat {} for flight {} to user {}",
            ticket.id, ticket.seat, flight_id, user_id
        );

        // The ticket is committed; delivery problems must not undo it.
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!("Notification {} for ticket {} not delivered: {}", notification.id, ticket.id, e);
        }

        Ok(ticket)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<TicketSummary>> {
        Ok(self.tickets.tickets_for_user(user_id).await?)
    }

    pub async fn notifications_for_user(
        &self,
        user_id: Uuid,
    ) -> CoreResult<Vec<NotificationRecord>> {
        Ok(self.tickets.notifications_for_user(user_id).await?)
    }
}
