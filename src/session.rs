use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::{
    auth::{self, Claims},
    config::AppConfig,
    models::{ErrorInfo, Session, SessionLookup, SessionUser},
};

/// SessionError
///
/// Everything that can go wrong while resolving a session. None of these reach the
/// client: the lookup degrades to anonymous and the error is only logged.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session lookup transport error: {0}")]
    Transport(String),
    #[error("session lookup timed out")]
    Timeout,
    #[error("auth service answered with status {0}")]
    Status(u16),
    #[error("session payload could not be decoded: {0}")]
    Decode(String),
    #[error("session token rejected: {0}")]
    InvalidToken(String),
    #[error("session token expired")]
    Expired,
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SessionError::Timeout
        } else if err.is_decode() {
            SessionError::Decode(err.to_string())
        } else {
            SessionError::Transport(err.to_string())
        }
    }
}

impl From<&SessionError> for ErrorInfo {
    fn from(err: &SessionError) -> Self {
        let status = match err {
            SessionError::Status(code) => Some(*code),
            SessionError::InvalidToken(_) | SessionError::Expired => Some(401),
            _ => None,
        };
        ErrorInfo {
            message: err.to_string(),
            status,
        }
    }
}

/// into_lookup
///
/// Folds a provider result into the `{ data, error }` shape, dropping sessions whose
/// expiry has passed.
fn into_lookup(result: Result<Option<Session>, SessionError>) -> SessionLookup {
    match result {
        Ok(Some(session)) if session.is_expired(Utc::now()) => {
            tracing::debug!("Session expired at {:?}; treating caller as anonymous", session.expires_at);
            SessionLookup::anonymous()
        }
        Ok(Some(session)) => SessionLookup::found(session),
        Ok(None) => SessionLookup::anonymous(),
        Err(err) => {
            tracing::warn!("Session lookup failed: {}", err);
            SessionLookup::failed(ErrorInfo::from(&err))
        }
    }
}

// 1. SessionProvider Contract
/// SessionProvider
///
/// The external session collaborator. One call per guarded request; implementations
/// never fail outright, they report failure in `SessionLookup::error`.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> SessionLookup;
}

/// SessionState
///
/// The shared handle on the configured provider held in the application state.
pub type SessionState = Arc<dyn SessionProvider>;

/// provider_from_config
///
/// Picks the JWT provider when a session secret is configured, otherwise asks the
/// auth service over HTTP.
pub fn provider_from_config(config: &AppConfig) -> Result<SessionState, SessionError> {
    let provider: SessionState = match &config.session_jwt_secret {
        Some(secret) => Arc::new(JwtSessionProvider::new(secret, &config.session_cookie_name)),
        None => Arc::new(HttpSessionProvider::new(
            &config.auth_api_url,
            config.session_timeout,
        )?),
    };
    Ok(provider)
}

// 2. Auth Service Implementation
/// Body of `GET /api/auth/get-session`. The whole body may also be `null`.
#[derive(Deserialize)]
struct GetSessionBody {
    user: Option<SessionUser>,
    #[serde(default)]
    session: Option<SessionMeta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionMeta {
    expires_at: Option<DateTime<Utc>>,
}

/// HttpSessionProvider
///
/// Resolves the session by forwarding the caller's cookies to the auth service.
#[derive(Clone)]
pub struct HttpSessionProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSessionProvider {
    pub fn new(auth_api_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/auth/get-session", auth_api_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .header(header::ACCEPT, "application/json");

        if let Some(cookies) = headers.get(header::COOKIE) {
            request = request.header(header::COOKIE, cookies.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status(status.as_u16()));
        }

        let body: Option<GetSessionBody> = response.json().await?;

        Ok(body.and_then(|body| {
            body.user.map(|user| Session {
                user: Some(user),
                expires_at: body.session.and_then(|meta| meta.expires_at),
            })
        }))
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> SessionLookup {
        into_lookup(self.fetch(headers).await)
    }
}

// 3. Signed Token Implementation
/// JwtSessionProvider
///
/// Resolves the session locally from an HS256 token in the session cookie (or a
/// Bearer header), for deployments where the auth service issues signed tokens.
#[derive(Clone)]
pub struct JwtSessionProvider {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl JwtSessionProvider {
    pub fn new(secret: &str, cookie_name: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cookie_name.to_string(),
        }
    }

    fn decode_session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let Some(token) = auth::extract_session_token(headers, &self.cookie_name) else {
            return Ok(None);
        };

        let token_data = decode::<Claims>(&token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        Ok(Some(Session {
            expires_at: DateTime::from_timestamp(claims.exp as i64, 0),
            user: Some(SessionUser::new(claims.sub, claims.role)),
        }))
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> SessionLookup {
        into_lookup(self.decode_session(headers))
    }
}

// 4. The Mock Implementation (For Tests)
/// MockSessionProvider
///
/// Returns a fixed lookup result and counts how often it was asked.
pub struct MockSessionProvider {
    lookup: SessionLookup,
    calls: AtomicUsize,
}

impl MockSessionProvider {
    pub fn new(lookup: SessionLookup) -> Self {
        Self {
            lookup,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(SessionLookup::anonymous())
    }

    pub fn authenticated(id: &str, role: &str) -> Self {
        Self::new(SessionLookup::found(Session::for_user(SessionUser::new(id, role))))
    }

    pub fn new_failing() -> Self {
        Self::new(SessionLookup::failed(ErrorInfo {
            message: "Mock Session Error: Simulation requested".to_string(),
            status: Some(500),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn get_session(&self, _headers: &HeaderMap) -> SessionLookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lookup.clone()
    }
}
