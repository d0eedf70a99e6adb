//! Error types for the platform-access crate.
//!
//! - `AuthenticationError`: the request could not be tied to a person
//! - `AuthorizationError`: the caller is known but not allowed to act

use cutlist_core::PersonId;
use std::fmt;

/// Errors from authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No token was presented.
    MissingToken,
    /// Session not found.
    InvalidSession { session_id: String },
    /// Session has expired.
    SessionExpired { session_id: String },
    /// The session's person no longer exists.
    PersonNotFound { person_id: PersonId },
    /// The session's person has been deactivated.
    PersonInactive { person_id: PersonId },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "no access token presented"),
            Self::InvalidSession { session_id } => {
                write!(f, "invalid session: {session_id}")
            }
            Self::SessionExpired { session_id } => {
                write!(f, "session has expired: {session_id}")
            }
            Self::PersonNotFound { person_id } => {
                write!(f, "person not found for session: {person_id}")
            }
            Self::PersonInactive { person_id } => {
                write!(f, "person is inactive: {person_id}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from authorization checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The caller tried to act on their own record where that is forbidden.
    SelfActionForbidden { person_id: PersonId, action: String },
    /// The caller lacks the required permission.
    PermissionDenied {
        person_id: PersonId,
        action: String,
        resource: String,
    },
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfActionForbidden { person_id, action } => {
                write!(f, "person {person_id} cannot {action} themselves")
            }
            Self::PermissionDenied {
                person_id,
                action,
                resource,
            } => {
                write!(
                    f,
                    "person {person_id} lacks permission to {action} on {resource}"
                )
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}
