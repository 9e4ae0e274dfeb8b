use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod board;
pub mod control;
pub mod error;
pub mod middleware;
pub mod reports;
pub mod state;
pub mod tickets;
pub mod users;

pub use state::{AppState, ServiceSettings};

use middleware::auth::{admin_auth_middleware, session_auth_middleware};

/// Builds the router. `allowed_origin` of `None` allows any origin.
pub fn app(state: AppState, allowed_origin: Option<&str>) -> Router {
    let origin = allowed_origin.and_then(|o| HeaderValue::from_str(o).ok());
    let cors = match origin {
        Some(origin) => CorsLayer::new().allow_origin(origin),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
    .allow_headers([
        axum::http::header::AUTHORIZATION,
        axum::http::header::CONTENT_TYPE,
        axum::http::header::USER_AGENT,
    ]);

    let session = from_fn_with_state(state.clone(), session_auth_middleware);
    let admin = from_fn_with_state(state.clone(), admin_auth_middleware);

    // route_layer only wraps the methods registered before it
    Router::new()
        .route("/health", get(health))
        .merge(users::routes())
        .merge(board::routes())
        .route(
            "/tickets",
            get(tickets::list_tickets)
                .route_layer(session.clone())
                .post(tickets::issue_ticket),
        )
        .route(
            "/notifications",
            get(tickets::list_notifications).route_layer(session),
        )
        .route(
            "/control/tokens",
            get(control::list_tokens)
                .route_layer(admin.clone())
                .post(control::issue_token),
        )
        .route("/control/escalate", post(control::escalate))
        .route("/reports/sales", get(reports::sales_report).route_layer(admin))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
