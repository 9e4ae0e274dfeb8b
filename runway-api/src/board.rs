use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use runway_core::{Credentials, FlightRecord};

use crate::{error::AppError, state::AppState, users::MessageResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FlightInput {
    pub flight_number: String,
    pub destination: String,
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    pub departure: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlightRequest {
    pub credentials: Credentials,
    pub flight: FlightInput,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub credentials: Credentials,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub credentials: Credentials,
}

#[derive(Debug, Serialize)]
pub struct DestinationsResponse {
    pub destinations: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/board", get(list_board).post(create_flight))
        .route("/board/destinations", get(open_destinations))
        .route("/board/{id}/status", put(change_status))
        .route("/board/{id}", delete(delete_flight))
}

async fn list_board(State(state): State<AppState>) -> Result<Json<Vec<FlightRecord>>, AppError> {
    Ok(Json(state.board.list_board().await?))
}

async fn open_destinations(
    State(state): State<AppState>,
) -> Result<Json<DestinationsResponse>, AppError> {
    let destinations = state.board.list_open_destinations().await?;
    Ok(Json(DestinationsResponse { destinations }))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<CreateFlightRequest>,
) -> Result<Json<FlightRecord>, AppError> {
    state.accounts.authenticate(&req.credentials).await?;

    let flight = state
        .board
        .create(&req.flight.flight_number, &req.flight.destination, &req.flight.departure)
        .await?;
    Ok(Json(flight))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<FlightRecord>, AppError> {
    state.accounts.authenticate(&req.credentials).await?;

    Ok(Json(state.board.change_status(id, &req.status).await?))
}

async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.authenticate(&req.credentials).await?;

    state.board.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Flight deleted".to_string(),
    }))
}
