use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use runway_core::CoreError;

use crate::state::AppState;

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

// ============================================================================
// Session Authentication Middleware
// ============================================================================

/// Verifies the bearer session and injects its `SessionClaims`
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.accounts.vault().verify_session(token).map_err(|_| {
        warn!("Rejected bearer session on {}", req.uri().path());
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

/// Verifies the bearer session, then checks the role on the stored account.
///
/// The role claim inside the token is not trusted: a deleted account is 401
/// and an account without the role is 403.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state
        .accounts
        .vault()
        .verify_session(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let account = state.accounts.account(claims.sub).await.map_err(|err| match err {
        CoreError::NotFoundError { .. } => {
            warn!("Session for missing user {} rejected", claims.sub);
            StatusCode::UNAUTHORIZED
        }
        CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        other => {
            error!("Admin check failed: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    if !account.is_admin() {
        warn!("User {} is not an administrator", account.username);
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
