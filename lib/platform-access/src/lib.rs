//! Platform access for cutlist: roles, permissions, sessions and the
//! identity of the caller of a request.
//!
//! # Access Control Model
//!
//! Every person carries exactly one [`Role`]. Permission predicates are
//! derived from it:
//! - admin permission: `admin`
//! - manager permission: `admin`, `manager`
//! - person permission: every studio staff role (`admin`, `manager`,
//!   `supervisor`, `user`), but not external `client`/`vendor` accounts
//!
//! A request is always made on behalf of a [`Caller`], which handlers take
//! as an explicit argument.
//!
//! # Example
//!
//! ```
//! use cutlist_core::PersonId;
//! use cutlist_platform_access::{Caller, Role};
//!
//! let me = PersonId::new();
//! let caller = Caller::new(me, Role::Supervisor);
//!
//! assert!(caller.is_self(me));
//! assert!(!caller.is_admin());
//! assert!(caller.role().has_person_permissions());
//! ```

pub mod auth;
pub mod error;
pub mod role;
pub mod session;

pub use auth::Caller;
pub use error::{AuthenticationError, AuthorizationError};
pub use role::Role;
pub use session::{Session, SessionId, SessionKind};
