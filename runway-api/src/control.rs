use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;

use runway_access::SessionClaims;
use runway_core::{Credentials, MasterToken};

use crate::{board::CredentialsRequest, error::AppError, state::AppState, users::SessionResponse};

#[derive(Debug, Deserialize)]
pub struct EscalationRequest {
    pub username: String,
    pub password: String,
    pub master_token: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<MasterToken>, AppError> {
    Ok(Json(state.access.issue_token(&req.credentials).await?))
}

pub async fn list_tokens(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<MasterToken>>, AppError> {
    Ok(Json(state.access.list_tokens(claims.sub).await?))
}

pub async fn escalate(
    State(state): State<AppState>,
    Json(req): Json<EscalationRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let credentials = Credentials::new(req.username, req.password);
    let session = state
        .access
        .request_escalation(&credentials, &req.master_token)
        .await?;
    Ok(Json(SessionResponse { token: session.token }))
}
