//! Identity of the caller of a request.

use crate::role::Role;
use cutlist_core::PersonId;

/// The authenticated person a request is made on behalf of.
///
/// Resolved once per request by the authentication layer and passed
/// explicitly to every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    person_id: PersonId,
    role: Role,
}

impl Caller {
    /// Creates a caller identity.
    #[must_use]
    pub fn new(person_id: PersonId, role: Role) -> Self {
        Self { person_id, role }
    }

    /// Returns the caller's person ID.
    #[must_use]
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// Returns the caller's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns true if the caller has admin access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns true if `person_id` is the caller.
    #[must_use]
    pub fn is_self(&self, person_id: PersonId) -> bool {
        self.person_id == person_id
    }
}
