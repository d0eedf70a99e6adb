//! Who may see and change what on a person record.
//!
//! Write access is an explicit rule table ([`FIELD_RULES`]): every field
//! carries exactly one [`FieldRule`], and filtering a request body is a
//! lookup in that table. Keys that are not person fields are dropped.

use crate::field::PersonField;
use crate::person::Person;
use cutlist_platform_access::{AuthorizationError, Caller};
use serde_json::{Map, Value};

/// How much of a person record a caller gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewLevel {
    /// Every field including the password hash.
    Full,
    /// Every field except the password hash and token identifier.
    Safe,
    /// The reduced presentation shown to regular members.
    Minimal,
}

/// Who may write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Never writable through the resource.
    Protected,
    /// Writable by anyone allowed to update the record (self or admin).
    Owner,
    /// Writable by admins and by callers holding person permissions.
    PersonManager,
    /// Writable by admins only.
    Admin,
}

/// Write rule of every person field.
pub const FIELD_RULES: [(PersonField, FieldRule); 24] = [
    (PersonField::Id, FieldRule::Protected),
    (PersonField::Password, FieldRule::Protected),
    (PersonField::Jti, FieldRule::Protected),
    (PersonField::CreatedAt, FieldRule::Protected),
    (PersonField::UpdatedAt, FieldRule::Protected),
    (PersonField::FirstName, FieldRule::Owner),
    (PersonField::LastName, FieldRule::Owner),
    (PersonField::Email, FieldRule::Owner),
    (PersonField::Phone, FieldRule::Owner),
    (PersonField::DesktopLogin, FieldRule::Owner),
    (PersonField::Timezone, FieldRule::Owner),
    (PersonField::Locale, FieldRule::Owner),
    (PersonField::HasAvatar, FieldRule::Owner),
    (PersonField::ExpirationDate, FieldRule::PersonManager),
    (PersonField::Role, FieldRule::Admin),
    (PersonField::Departments, FieldRule::Admin),
    (PersonField::Active, FieldRule::Admin),
    (PersonField::IsBot, FieldRule::Admin),
    (PersonField::Archived, FieldRule::Admin),
    (PersonField::LoginFailedAttempts, FieldRule::Admin),
    (PersonField::LastLoginFailed, FieldRule::Admin),
    (PersonField::IsGeneratedFromLdap, FieldRule::Admin),
    (PersonField::LdapUid, FieldRule::Admin),
    (PersonField::LastPresence, FieldRule::Admin),
];

/// Fields stripped from every single-person read.
pub const READ_PROTECTED: [PersonField; 2] = [PersonField::Password, PersonField::Jti];

/// Outcome of filtering a request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredFields {
    /// Keys the caller may write, with their requested values.
    pub allowed: Map<String, Value>,
    /// Keys removed from the request.
    pub dropped: Vec<String>,
}

/// Access policy of the person resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Returns the write rule of `field`.
    #[must_use]
    pub fn rule_for(&self, field: PersonField) -> FieldRule {
        FIELD_RULES
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map_or(FieldRule::Protected, |(_, rule)| *rule)
    }

    /// Returns true if `caller` may write a field governed by `rule`.
    #[must_use]
    pub fn may_write(&self, caller: &Caller, rule: FieldRule) -> bool {
        match rule {
            FieldRule::Protected => false,
            FieldRule::Owner => true,
            FieldRule::PersonManager => {
                caller.is_admin() || caller.role().has_person_permissions()
            }
            FieldRule::Admin => caller.is_admin(),
        }
    }

    /// View level of the person listing.
    #[must_use]
    pub fn list_view(&self, caller: &Caller, with_pass_hash: bool) -> ViewLevel {
        match (caller.is_admin(), with_pass_hash) {
            (true, true) => ViewLevel::Full,
            (true, false) => ViewLevel::Safe,
            (false, _) => ViewLevel::Minimal,
        }
    }

    /// View level of a single-person read.
    #[must_use]
    pub fn detail_view(&self, caller: &Caller, is_self: bool) -> ViewLevel {
        if is_self || caller.role().has_manager_permissions() {
            ViewLevel::Safe
        } else {
            ViewLevel::Minimal
        }
    }

    /// Any authenticated caller may read a person; the view level does the
    /// filtering.
    #[must_use]
    pub fn can_read_detail(&self, _caller: &Caller, _is_self: bool) -> bool {
        true
    }

    /// Keeps the keys of `requested` that `caller` may write.
    #[must_use]
    pub fn filter_update_fields(
        &self,
        caller: &Caller,
        requested: Map<String, Value>,
    ) -> FilteredFields {
        let mut filtered = FilteredFields::default();
        for (key, value) in requested {
            let writable = PersonField::from_key(&key)
                .is_some_and(|field| self.may_write(caller, self.rule_for(field)));
            if writable {
                filtered.allowed.insert(key, value);
            } else {
                filtered.dropped.push(key);
            }
        }
        filtered
    }

    /// Self-updates are allowed; anything else needs admin permission.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when a non-admin updates someone else.
    pub fn check_update(&self, caller: &Caller, target: &Person) -> Result<(), AuthorizationError> {
        if caller.is_self(target.id) || caller.is_admin() {
            return Ok(());
        }
        Err(AuthorizationError::PermissionDenied {
            person_id: caller.person_id(),
            action: "update".to_string(),
            resource: format!("person:{}", target.id),
        })
    }

    /// Nobody may delete themselves; deleting others needs admin permission.
    ///
    /// # Errors
    ///
    /// Returns `SelfActionForbidden` on self-deletion, `PermissionDenied`
    /// for non-admins.
    pub fn check_delete(&self, caller: &Caller, target: &Person) -> Result<(), AuthorizationError> {
        if caller.is_self(target.id) {
            return Err(AuthorizationError::SelfActionForbidden {
                person_id: caller.person_id(),
                action: "delete".to_string(),
            });
        }
        if !caller.is_admin() {
            return Err(AuthorizationError::PermissionDenied {
                person_id: caller.person_id(),
                action: "delete".to_string(),
                resource: format!("person:{}", target.id),
            });
        }
        Ok(())
    }

    /// Removes read-protected keys from a serialized person.
    pub fn strip_protected(&self, presented: &mut Map<String, Value>) {
        for field in READ_PROTECTED {
            presented.remove(field.as_str());
        }
    }
}
