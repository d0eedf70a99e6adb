//! Error types for the people crate.
//!
//! Errors are layered with rootcause:
//! - `StoreError`: failures reported by the persistence ports
//! - `SideEffectError`: failures of post-commit effects (cache, index, events)
//! - `PersonError`: what a person operation reports to its caller; lower
//!   layers are attached as children via `.context()`

use cutlist_core::PersonId;
use cutlist_platform_access::AuthorizationError;
use rootcause::Report;
use std::fmt;

/// Errors from the persistence ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A statement was rejected by the database.
    Statement { details: String },
    /// The database could not be reached.
    Connection { details: String },
    /// A stored row could not be decoded into a domain value.
    Decode { details: String },
    /// A deletion was refused because other records still reference the row.
    DeletionBlocked { relation: String, count: u64 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statement { details } => write!(f, "{details}"),
            Self::Connection { details } => write!(f, "database unavailable: {details}"),
            Self::Decode { details } => write!(f, "invalid stored data: {details}"),
            Self::DeletionBlocked { relation, count } => {
                write!(f, "{count} {relation} still reference this record")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from post-commit side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffectError {
    /// Cache invalidation failed.
    Cache { details: String },
    /// Search index update failed.
    Index { details: String },
    /// Event publication failed.
    Publish { details: String },
}

impl fmt::Display for SideEffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache { details } => write!(f, "cache invalidation failed: {details}"),
            Self::Index { details } => write!(f, "search index update failed: {details}"),
            Self::Publish { details } => write!(f, "event publication failed: {details}"),
        }
    }
}

impl std::error::Error for SideEffectError {}

/// Errors reported by person operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonError {
    /// The person does not exist or the identifier is malformed.
    NotFound { id: String },
    /// The caller may not perform the operation.
    PermissionDenied { reason: String },
    /// A request parameter is invalid.
    WrongParameter { message: String },
    /// The person's email is a protected account and cannot be deactivated.
    PersonInProtectedAccounts { email: String },
    /// A department referenced by the request does not exist.
    DepartmentNotFound { id: String },
    /// The person is still referenced and deletion was not forced.
    ModelWithRelations { id: PersonId, details: String },
    /// The operation is not available on this resource.
    MethodNotAllowed,
    /// A database statement failed.
    Database { details: String },
}

impl PersonError {
    pub(crate) fn wrong_parameter(message: impl Into<String>) -> Self {
        Self::WrongParameter {
            message: message.into(),
        }
    }

    /// Wraps a store failure, logging it.
    ///
    /// A refused deletion becomes `ModelWithRelations`; anything else is a
    /// `Database` error carrying the store's message.
    pub(crate) fn from_store(report: Report<StoreError>, person_id: PersonId) -> Report<Self> {
        let context = match report.current_context() {
            blocked @ StoreError::DeletionBlocked { .. } => Self::ModelWithRelations {
                id: person_id,
                details: blocked.to_string(),
            },
            other => {
                tracing::error!(%person_id, error = %other, "person store operation failed");
                Self::Database {
                    details: other.to_string(),
                }
            }
        };
        report.context(context)
    }

    /// Wraps a failed query that concerns no single person.
    pub(crate) fn database<C>(report: Report<C>) -> Report<Self>
    where
        C: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        let details = report.current_context().to_string();
        tracing::error!(error = %details, "person query failed");
        report.context(Self::Database { details })
    }
}

impl fmt::Display for PersonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "person '{id}' not found"),
            Self::PermissionDenied { reason } => write!(f, "permission denied: {reason}"),
            Self::WrongParameter { message } => write!(f, "{message}"),
            Self::PersonInProtectedAccounts { .. } => write!(
                f,
                "Can't set this person as inactive it's a protected account."
            ),
            Self::DepartmentNotFound { id } => write!(f, "department '{id}' not found"),
            Self::ModelWithRelations { id, details } => {
                write!(f, "person {id} cannot be deleted: {details}")
            }
            Self::MethodNotAllowed => write!(f, "method not allowed"),
            Self::Database { details } => write!(f, "{details}"),
        }
    }
}

impl std::error::Error for PersonError {}

impl From<AuthorizationError> for PersonError {
    fn from(err: AuthorizationError) -> Self {
        Self::PermissionDenied {
            reason: err.to_string(),
        }
    }
}
