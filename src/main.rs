use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    session::provider_from_config,
};

/// main
///
/// Loads configuration, sets up logging, builds the session provider and upstream
/// relay, then serves the gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // .env settings are loaded before any variable is read.
    dotenv::dotenv().ok();
    // Missing production URLs abort startup here.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins, otherwise a development-friendly default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tutor_gate=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for reading in a terminal.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per line for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);
    if config.dev_bypass {
        tracing::warn!("Development session bypass enabled via x-user-id / x-user-role headers");
    }

    // 4. Session Collaborator
    // A configured JWT secret selects local token validation over the auth service.
    let sessions = provider_from_config(&config)
        .expect("FATAL: Failed to build the session provider.");
    match &config.session_jwt_secret {
        Some(_) => tracing::info!("Sessions resolved from signed token cookie {}", config.session_cookie_name),
        None => tracing::info!("Sessions resolved via auth service at {}", config.auth_api_url),
    }

    // 5. State and Router Assembly
    // Route tables, activation pattern and upstream relay are built here.
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, sessions)
        .expect("FATAL: Failed to build the upstream client.");
    tracing::info!("Forwarding allowed requests to {}", app_state.upstream.base_url());

    let app = create_router(app_state);

    // 6. Server Startup
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/_gate/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: Server terminated unexpectedly.");
}
