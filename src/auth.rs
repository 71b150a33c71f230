use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::{
    config::{AppConfig, Env},
    models::{Session, SessionLookup, SessionUser},
    session::SessionState,
};

/// Header carrying the user id for the local development bypass.
pub const DEV_USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the role for the local development bypass.
pub const DEV_USER_ROLE_HEADER: &str = "x-user-role";

/// Claims
///
/// Payload of a signed session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as issued by the auth service.
    pub sub: String,
    /// Role string, matched against the role constants by the guard.
    pub role: String,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
}

/// extract_session_token
///
/// Reads the token from the named cookie, falling back to `Authorization: Bearer`.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| Cookie::split_parse_encoded(raw))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// local_bypass_user
///
/// Builds a user from the development headers when both are present.
fn local_bypass_user(headers: &HeaderMap) -> Option<SessionUser> {
    let id = headers.get(DEV_USER_ID_HEADER)?.to_str().ok()?;
    let role = headers.get(DEV_USER_ROLE_HEADER)?.to_str().ok()?;
    if id.is_empty() {
        return None;
    }
    Some(SessionUser::new(id, role))
}

/// resolve_session
///
/// The single session resolution step for a request. With the development bypass
/// enabled (`Env::Local` plus `dev_bypass`) the development headers short-circuit the
/// provider; otherwise they are ignored.
pub async fn resolve_session(
    headers: &HeaderMap,
    config: &AppConfig,
    sessions: &SessionState,
) -> SessionLookup {
    if config.env == Env::Local && config.dev_bypass {
        if let Some(user) = local_bypass_user(headers) {
            tracing::debug!("Local bypass session for user {} ({})", user.id, user.role);
            return SessionLookup::found(Session::for_user(user));
        }
    }

    sessions.get_session(headers).await
}

/// CallerSession
///
/// Extractor for the caller's session lookup. Never rejects: a failed or missing
/// session is an anonymous caller, not an error.
#[derive(Debug, Clone)]
pub struct CallerSession(pub SessionLookup);

impl<S> FromRequestParts<S> for CallerSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionState::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(CallerSession(
            resolve_session(&parts.headers, &config, &sessions).await,
        ))
    }
}
