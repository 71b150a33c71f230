use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access decision core.
pub mod guard;
pub mod matcher;
pub mod route_table;

// Session resolution and request plumbing.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod session;
pub mod upstream;

pub mod routes;
use routes::gateway::{self, GATEWAY_PREFIX};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use matcher::ActivationPattern;
pub use route_table::{RouteState, RouteTable};
pub use session::{MockSessionProvider, SessionState};
pub use upstream::{UpstreamClient, UpstreamState};

/// ApiDoc
///
/// OpenAPI document for the gateway's own endpoints, served at
/// `/_gate/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::decision_preview),
    components(schemas(
        models::DecisionPreview,
        models::Decision,
        models::RouteClass,
        models::Role,
    )),
    tags((name = "tutor-gate", description = "Role-aware access gateway for the tutoring front end"))
)]
struct ApiDoc;

/// AppState
///
/// Everything a request needs, shared read-only across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Session collaborator consulted once per guarded request.
    pub sessions: SessionState,
    /// Prefix tables the guard classifies paths against.
    pub routes: RouteState,
    /// Which paths the guard runs for at all.
    pub activation: Arc<ActivationPattern>,
    /// Relay for requests the guard lets through.
    pub upstream: UpstreamState,
    pub config: AppConfig,
}

impl AppState {
    /// new
    ///
    /// Assembles the state with the default route tables and an activation pattern
    /// derived from them and `config.include_root`.
    pub fn new(config: AppConfig, sessions: SessionState) -> Result<Self, reqwest::Error> {
        let upstream = UpstreamClient::new(&config.upstream_url, config.max_body_bytes)?;
        Ok(Self::with_routes(
            config,
            sessions,
            RouteTable::default(),
            Arc::new(upstream),
        ))
    }

    pub fn with_routes(
        config: AppConfig,
        sessions: SessionState,
        routes: RouteTable,
        upstream: UpstreamState,
    ) -> Self {
        for (prefix, owner, other) in routes.overlaps() {
            tracing::warn!(
                "Route prefix {} ({:?}) overlaps the {:?} table; the earlier table wins",
                prefix,
                owner,
                other
            );
        }

        let activation = ActivationPattern::from_table(&routes, config.include_root);

        Self {
            sessions,
            routes: Arc::new(routes),
            activation: Arc::new(activation),
            upstream,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gateway: its own endpoints under `/_gate`, the upstream relay as
/// fallback, the route guard around both, then request id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name used for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI and the OpenAPI JSON, both under the gateway prefix.
        .merge(
            SwaggerUi::new(format!("{GATEWAY_PREFIX}/swagger-ui"))
                .url(format!("{GATEWAY_PREFIX}/api-docs/openapi.json"), ApiDoc::openapi()),
        )
        // Gateway endpoints: health and decision preview.
        .nest(GATEWAY_PREFIX, gateway::gateway_routes())
        // Everything else belongs to the front end.
        .fallback(handlers::forward_upstream)
        // The guard sees every request; its activation pattern picks the ones it decides.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // 3b. Request Tracing: one span per request, tagged with its id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, carrying the `x-request-id` so every log line of the request
/// can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
