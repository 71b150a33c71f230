use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity ---

/// Role
///
/// The three roles known to the marketplace. The wire form is the exact upper-case
/// string issued by the auth service; anything else is treated as unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Tutor,
    Student,
}

impl Role {
    pub const ADMIN: &'static str = "ADMIN";
    pub const TUTOR: &'static str = "TUTOR";
    pub const STUDENT: &'static str = "STUDENT";

    /// Case-sensitive match against the role constants.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            Self::ADMIN => Some(Role::Admin),
            Self::TUTOR => Some(Role::Tutor),
            Self::STUDENT => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => Self::ADMIN,
            Role::Tutor => Self::TUTOR,
            Role::Student => Self::STUDENT,
        }
    }
}

/// SessionUser
///
/// The user attached to a session. The role is kept as the raw string so an
/// unrecognized value survives deserialization and is handled by the guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub role: String,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

/// Session
///
/// One caller session as resolved by a `SessionProvider`. Never stored by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Session {
    pub user: Option<SessionUser>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn for_user(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// ErrorInfo
///
/// Failure detail carried next to an empty session when the lookup failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub status: Option<u16>,
}

/// SessionLookup
///
/// The `{ data, error }` pair returned by every session provider. A caller is
/// authenticated only when there is no error, a session, and a user on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionLookup {
    pub data: Option<Session>,
    pub error: Option<ErrorInfo>,
}

impl SessionLookup {
    pub fn found(session: Session) -> Self {
        Self {
            data: Some(session),
            error: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        if self.error.is_some() {
            return None;
        }
        self.data.as_ref().and_then(|session| session.user.as_ref())
    }
}

// --- Routing ---

/// RouteClass
///
/// The bucket a request path falls into after classification against the route tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RouteClass {
    Admin,
    Tutor,
    Student,
    Common,
    Unmatched,
}

/// Decision
///
/// The terminal action of the guard for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum Decision {
    Forward,
    Redirect { location: String },
}

impl Decision {
    pub fn redirect(location: impl Into<String>) -> Self {
        Decision::Redirect {
            location: location.into(),
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Decision::Forward)
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Decision::Forward => None,
            Decision::Redirect { location } => Some(location),
        }
    }
}

// --- Response Schemas ---

/// DecisionPreview
///
/// Response of `GET /_gate/decision`: what the guard would do for `path` given the
/// caller's current session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DecisionPreview {
    pub path: String,
    /// Whether the activation pattern would run the guard for this path at all.
    pub activated: bool,
    pub class: RouteClass,
    pub authenticated: bool,
    pub role: Option<String>,
    pub decision: Decision,
}
