//! The person resource of cutlist.
//!
//! This crate owns everything about reading and mutating person records
//! that does not depend on a transport or a database:
//!
//! - [`AuthorizationPolicy`]: which fields a caller may see and change
//! - [`presentation`]: full, safe and minimal views of a person
//! - [`PersonChanges`]: typed partial updates parsed from request bodies
//! - [`ports`]: the collaborators the resource drives (store, cache,
//!   search index, deletion cascade, token issuer, event publisher)
//! - [`SideEffectCoordinator`]: post-commit effects of a mutation
//! - [`PersonItemHandler`] / [`PersonCollectionHandler`]: the operations
//!   exposed over HTTP
//!
//! Every operation takes the [`Caller`](cutlist_platform_access::Caller)
//! explicitly.

pub mod changes;
pub mod error;
pub mod field;
pub mod handler;
pub mod person;
pub mod policy;
pub mod ports;
pub mod presentation;
pub mod side_effects;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use changes::PersonChanges;
pub use error::{PersonError, SideEffectError, StoreError};
pub use field::PersonField;
pub use handler::{PeopleSettings, PersonCollectionHandler, PersonItemHandler};
pub use person::{Department, Person, PersonFilter};
pub use policy::{AuthorizationPolicy, FieldRule, FilteredFields, ViewLevel};
pub use ports::{
    DeletionCascade, DepartmentDirectory, EventPublisher, PersonCache, PersonEvent,
    PersonEventKind, PersonIndex, PersonStore, TokenIssuer,
};
pub use side_effects::{SideEffectCoordinator, UpdateOutcome};
