use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use runway_access::NewAccount;
use runway_core::Credentials;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users", axum::routing::delete(delete_account))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewAccount>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.accounts.register(payload).await?;
    Ok(Json(SessionResponse { token: session.token }))
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.accounts.login(&credentials).await?;
    Ok(Json(SessionResponse { token: session.token }))
}

async fn delete_account(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.delete(&credentials).await?;
    Ok(Json(MessageResponse {
        message: "Account deleted".to_string(),
    }))
}
