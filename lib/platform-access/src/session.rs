//! Sessions and access tokens.
//!
//! Both interactive logins and access tokens minted for a person (bots,
//! scripts) are sessions: an opaque token bound to a person with an expiry.
//! Sessions do not snapshot the role; the caller's role is resolved from the
//! person record on every request so role changes apply immediately.

use chrono::{DateTime, Duration, Utc};
use cutlist_core::PersonId;
use serde::{Deserialize, Serialize};

/// Opaque session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Interactive login.
    Login,
    /// Access token minted for a person.
    AccessToken,
}

impl SessionKind {
    /// Returns the stored name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::AccessToken => "access_token",
        }
    }

    /// Parses a stored kind name, defaulting unknown values to `Login`.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        match s {
            "access_token" => Self::AccessToken,
            _ => Self::Login,
        }
    }
}

/// An issued session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    person_id: PersonId,
    kind: SessionKind,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session valid for `duration` from now.
    #[must_use]
    pub fn new(id: SessionId, person_id: PersonId, kind: SessionKind, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            person_id,
            kind,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Reconstitutes a session from storage.
    #[must_use]
    pub fn with_all_fields(
        id: SessionId,
        person_id: PersonId,
        kind: SessionKind,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            person_id,
            kind,
            created_at,
            expires_at,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the person the session belongs to.
    #[must_use]
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// Returns how the session was obtained.
    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
