//! Catalogue of the person fields addressable by a request body.

use std::fmt;

/// A field of the person record as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PersonField {
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    DesktopLogin,
    Password,
    Jti,
    Role,
    Departments,
    Active,
    IsBot,
    Archived,
    ExpirationDate,
    LastLoginFailed,
    LoginFailedAttempts,
    IsGeneratedFromLdap,
    LdapUid,
    LastPresence,
    Timezone,
    Locale,
    HasAvatar,
    CreatedAt,
    UpdatedAt,
}

impl PersonField {
    /// Every field, in wire order.
    pub const ALL: [PersonField; 24] = [
        Self::Id,
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::DesktopLogin,
        Self::Password,
        Self::Jti,
        Self::Role,
        Self::Departments,
        Self::Active,
        Self::IsBot,
        Self::Archived,
        Self::ExpirationDate,
        Self::LastLoginFailed,
        Self::LoginFailedAttempts,
        Self::IsGeneratedFromLdap,
        Self::LdapUid,
        Self::LastPresence,
        Self::Timezone,
        Self::Locale,
        Self::HasAvatar,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    /// Returns the JSON key of the field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::DesktopLogin => "desktop_login",
            Self::Password => "password",
            Self::Jti => "jti",
            Self::Role => "role",
            Self::Departments => "departments",
            Self::Active => "active",
            Self::IsBot => "is_bot",
            Self::Archived => "archived",
            Self::ExpirationDate => "expiration_date",
            Self::LastLoginFailed => "last_login_failed",
            Self::LoginFailedAttempts => "login_failed_attempts",
            Self::IsGeneratedFromLdap => "is_generated_from_ldap",
            Self::LdapUid => "ldap_uid",
            Self::LastPresence => "last_presence",
            Self::Timezone => "timezone",
            Self::Locale => "locale",
            Self::HasAvatar => "has_avatar",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Looks a field up by its JSON key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

impl fmt::Display for PersonField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
