//! Collaborators driven by the person resource.
//!
//! The server provides Postgres, in-process and NATS implementations;
//! [`crate::testing`] provides in-memory ones.

use crate::error::{SideEffectError, StoreError};
use crate::person::{Department, Person, PersonFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cutlist_core::{DepartmentId, PersonId, Result};
use serde::Serialize;

/// Persistence of person records.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Fetches a person by id.
    async fn find(&self, id: PersonId) -> Result<Option<Person>, StoreError>;

    /// Lists persons matching `filter`, ordered by last then first name.
    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, StoreError>;

    /// Persists every column of `person`, including its department set.
    async fn save(&self, person: &Person) -> Result<(), StoreError>;

    /// Counts active persons that are not bots.
    async fn count_active_humans(&self) -> Result<u64, StoreError>;
}

/// Lookup of departments.
#[async_trait]
pub trait DepartmentDirectory: Send + Sync {
    /// Fetches a department by id.
    async fn find_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError>;
}

/// Removal of a person and everything that hangs off it.
#[async_trait]
pub trait DeletionCascade: Send + Sync {
    /// Deletes the person and its dependent rows.
    ///
    /// Without `force`, fails with [`StoreError::DeletionBlocked`] while the
    /// person is still referenced by production data.
    async fn remove_person(&self, id: PersonId, force: bool) -> Result<(), StoreError>;
}

/// Cache of person records consulted on every authenticated request.
#[async_trait]
pub trait PersonCache: Send + Sync {
    /// Drops any cached entry for `id`.
    async fn invalidate(&self, id: PersonId) -> Result<(), SideEffectError>;
}

/// Full-text index of active persons.
#[async_trait]
pub trait PersonIndex: Send + Sync {
    /// Removes `id` from the index. Removing an absent id succeeds.
    async fn remove(&self, id: PersonId) -> Result<(), SideEffectError>;

    /// Adds or replaces the document of `person`.
    async fn add(&self, person: &Person) -> Result<(), SideEffectError>;

    /// Returns ids of persons matching every term of `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PersonId>, SideEffectError>;
}

/// Issuer of access tokens bound to a person.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mints a new access token for `person`.
    async fn issue_for(&self, person: &Person) -> Result<String, StoreError>;
}

/// What happened to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PersonEventKind {
    #[serde(rename = "person:update")]
    Update,
    #[serde(rename = "person:delete")]
    Delete,
}

impl PersonEventKind {
    /// Returns the event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "person:update",
            Self::Delete => "person:delete",
        }
    }
}

/// Notification emitted after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonEvent {
    pub kind: PersonEventKind,
    pub person_id: PersonId,
    pub actor_id: PersonId,
    pub occurred_at: DateTime<Utc>,
}

impl PersonEvent {
    /// Creates an event stamped now.
    #[must_use]
    pub fn new(kind: PersonEventKind, person_id: PersonId, actor_id: PersonId) -> Self {
        Self {
            kind,
            person_id,
            actor_id,
            occurred_at: Utc::now(),
        }
    }
}

/// Sink for person events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `event`.
    async fn publish(&self, event: &PersonEvent) -> Result<(), SideEffectError>;
}
