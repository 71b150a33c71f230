use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Prefix for the gateway's own endpoints. It is outside every route table, so the
/// activation pattern never covers it.
pub const GATEWAY_PREFIX: &str = "/_gate";

/// Gateway Router Module
///
/// Endpoints answered by the gateway itself. Mounted under `/_gate`.
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        // GET /_gate/health
        // Returns "ok" for monitoring and load balancer checks.
        .route("/health", get(handlers::health))
        // GET /_gate/decision?path=...
        // Previews the guard decision for a path using the caller's session.
        .route("/decision", get(handlers::decision_preview))
}
