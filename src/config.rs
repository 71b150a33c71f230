use std::env;
use std::time::Duration;

/// AppConfig
///
/// Holds the gateway's entire configuration. Loaded once at startup, then cloned into
/// the shared state and pulled out by handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local session bypass and log format.
    pub env: Env,
    // Opt-in for the header-based session bypass. Only honoured in `Env::Local`.
    pub dev_bypass: bool,
    // Base URL of the auth service answering `/api/auth/get-session`.
    pub auth_api_url: String,
    // Base URL of the front-end server that forwarded requests are sent to.
    pub upstream_url: String,
    // Socket address the gateway listens on.
    pub bind_addr: String,
    // When set, sessions are read from a signed JWT instead of asking the auth service.
    pub session_jwt_secret: Option<String>,
    // Cookie carrying the session JWT.
    pub session_cookie_name: String,
    // Outbound timeout for the session lookup.
    pub session_timeout: Duration,
    // Adds `/` and `/home` to the activation pattern.
    pub include_root: bool,
    // Largest request body forwarded upstream.
    pub max_body_bytes: usize,
}

/// Env
///
/// Runtime context. `Local` allows the header-based session bypass (when opted in via
/// `GUARD_DEV_BYPASS`) and pretty logs.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_COOKIE: &str = "session_token";
const DEFAULT_SESSION_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

impl Default for AppConfig {
    /// Non-panicking configuration for tests; nothing is read from the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            dev_bypass: false,
            auth_api_url: "http://localhost:5000".to_string(),
            upstream_url: "http://localhost:3000".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_jwt_secret: None,
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            session_timeout: Duration::from_millis(DEFAULT_SESSION_TIMEOUT_MS),
            include_root: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            fallback
        }),
        Err(_) => fallback,
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `AUTH_API_URL` or `UPSTREAM_URL` is missing, so the
    /// gateway never starts pointing at a development address.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let defaults = Self::default();

        let (auth_api_url, upstream_url) = match env {
            Env::Production => (
                non_empty("AUTH_API_URL").expect("FATAL: AUTH_API_URL required in prod"),
                non_empty("UPSTREAM_URL").expect("FATAL: UPSTREAM_URL required in prod"),
            ),
            Env::Local => (
                non_empty("AUTH_API_URL").unwrap_or(defaults.auth_api_url),
                non_empty("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            ),
        };

        // Off unless explicitly opted in, and never in production.
        let dev_bypass = parse_or("GUARD_DEV_BYPASS", false);
        if dev_bypass && env == Env::Production {
            tracing::warn!("GUARD_DEV_BYPASS is ignored in production");
        }

        Self {
            dev_bypass: dev_bypass && env == Env::Local,
            env,
            auth_api_url: auth_api_url.trim_end_matches('/').to_string(),
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_jwt_secret: non_empty("SESSION_JWT_SECRET"),
            session_cookie_name: non_empty("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            session_timeout: Duration::from_millis(parse_or(
                "SESSION_TIMEOUT_MS",
                DEFAULT_SESSION_TIMEOUT_MS,
            )),
            include_root: parse_or("GUARD_INCLUDE_ROOT", true),
            max_body_bytes: parse_or("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }
}
