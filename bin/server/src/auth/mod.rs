//! Authentication for the cutlist server.
//!
//! This module provides:
//! - Database-backed sessions, for both login sessions and access tokens
//! - The [`RequireAuth`] extractor that turns a request into a
//!   [`Caller`](cutlist_platform_access::Caller)
//!
//! The caller's role is not stored in the session. It is read from the
//! person cache on every request, so role changes and deactivations apply
//! as soon as the person is updated.

pub mod db;
pub mod middleware;

pub use db::{SessionRepository, SessionTokenIssuer, generate_session_id};
pub use middleware::RequireAuth;

use crate::cache::CachedPersons;
use async_trait::async_trait;
use cutlist_core::Result;
use cutlist_people::{PersonCollectionHandler, PersonItemHandler, StoreError};
use cutlist_platform_access::{Session, SessionId};
use std::sync::Arc;

/// Persistence of sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Finds a session by ID.
    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Creates a new session.
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    /// Deletes a session by ID.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;
}

/// Shared application state.
pub struct AppState {
    /// Single-person operations.
    pub items: PersonItemHandler,
    /// Collection operations.
    pub collection: PersonCollectionHandler,
    /// Person cache used to resolve callers.
    pub persons: Arc<CachedPersons>,
    /// Session storage.
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        items: PersonItemHandler,
        collection: PersonCollectionHandler,
        persons: Arc<CachedPersons>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            items,
            collection,
            persons,
            sessions,
        }
    }
}
