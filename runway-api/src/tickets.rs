use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use runway_access::SessionClaims;
use runway_core::{Credentials, NotificationRecord, TicketRecord, TicketSummary};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IssueTicketRequest {
    pub credentials: Credentials,
    pub flight_id: Uuid,
}

/// Issues a ticket to the caller on the given flight
pub async fn issue_ticket(
    State(state): State<AppState>,
    Json(req): Json<IssueTicketRequest>,
) -> Result<Json<TicketRecord>, AppError> {
    let account = state.accounts.authenticate(&req.credentials).await?;

    Ok(Json(state.ledger.issue(account.id, req.flight_id).await?))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<TicketSummary>>, AppError> {
    Ok(Json(state.ledger.list_for_user(claims.sub).await?))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    Ok(Json(state.ledger.notifications_for_user(claims.sub).await?))
}
