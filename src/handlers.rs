use crate::{
    AppState,
    auth::CallerSession,
    guard,
    models::DecisionPreview,
};
use axum::{
    Json,
    extract::{Query, Request, State},
    response::Response,
};
use serde::Deserialize;

// --- Query Structs ---

/// PreviewQuery
///
/// Query parameters for `GET /_gate/decision`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    /// Request path to evaluate, e.g. `/tutor-dashboard/bookings`.
    pub path: String,
}

// --- Handlers ---

/// health
///
/// [Gateway Route] Liveness probe for load balancers.
#[utoipa::path(
    get,
    path = "/_gate/health",
    responses((status = 200, description = "Gateway is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// decision_preview
///
/// [Gateway Route] Reports what the guard would do with `path` for the caller's
/// current session, without forwarding anything. Used by the front end to decide
/// where to send a user after login.
#[utoipa::path(
    get,
    path = "/_gate/decision",
    params(PreviewQuery),
    responses((status = 200, description = "Guard decision for the path", body = DecisionPreview))
)]
pub async fn decision_preview(
    CallerSession(lookup): CallerSession,
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Json<DecisionPreview> {
    Json(guard::preview(
        &state.routes,
        &state.activation,
        &query.path,
        &lookup,
    ))
}

/// forward_upstream
///
/// Fallback for every path the gateway does not serve itself. Runs behind
/// `guard::route_guard`, so anything reaching it has been allowed through.
pub async fn forward_upstream(State(state): State<AppState>, request: Request) -> Response {
    state.upstream.forward(request).await
}
