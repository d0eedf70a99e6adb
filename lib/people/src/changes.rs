//! Typed partial updates of a person.
//!
//! A request body is first filtered by the
//! [`AuthorizationPolicy`](crate::AuthorizationPolicy); the remaining keys
//! are parsed here. Nullable columns use `Option<Option<T>>`: the outer
//! option says whether the key was present, the inner one carries `null`.

use crate::error::PersonError;
use crate::field::PersonField;
use crate::person::Person;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use cutlist_core::DepartmentId;
use cutlist_platform_access::Role;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A parsed partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub desktop_login: Option<Option<String>>,
    pub timezone: Option<Option<String>>,
    pub locale: Option<Option<String>>,
    pub has_avatar: Option<bool>,
    pub expiration_date: Option<Option<NaiveDate>>,
    pub role: Option<Role>,
    /// Raw department ids, resolved against the directory before applying.
    pub departments: Option<Vec<String>>,
    pub active: Option<bool>,
    pub is_bot: Option<bool>,
    pub archived: Option<bool>,
    pub login_failed_attempts: Option<i32>,
    pub last_login_failed: Option<Option<DateTime<Utc>>>,
    pub is_generated_from_ldap: Option<bool>,
    pub ldap_uid: Option<Option<String>>,
    pub last_presence: Option<Option<NaiveDate>>,
    fields: BTreeSet<PersonField>,
}

impl PersonChanges {
    /// Parses filtered request fields.
    ///
    /// # Errors
    ///
    /// Returns `WrongParameter` naming the first field whose value has the
    /// wrong type or format. Keys that are not writable person fields are
    /// rejected the same way; they never reach here after filtering.
    pub fn parse(fields: Map<String, Value>) -> Result<Self, PersonError> {
        let mut changes = Self::default();
        for (key, value) in fields {
            let field = PersonField::from_key(&key).ok_or_else(|| {
                PersonError::wrong_parameter(format!("{key} is not a person field"))
            })?;
            changes.set(field, value)?;
            changes.fields.insert(field);
        }
        Ok(changes)
    }

    /// Returns true if the update carries `field`.
    #[must_use]
    pub fn contains(&self, field: PersonField) -> bool {
        self.fields.contains(&field)
    }

    /// Fields carried by the update.
    pub fn fields(&self) -> impl Iterator<Item = PersonField> + '_ {
        self.fields.iter().copied()
    }

    /// Applies the update to `person`.
    ///
    /// `departments` replaces the department set when present; it is the
    /// resolved form of [`Self::departments`].
    pub fn apply(self, person: &mut Person, departments: Option<BTreeSet<DepartmentId>>) {
        if let Some(first_name) = self.first_name {
            person.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            person.last_name = last_name;
        }
        if let Some(email) = self.email {
            person.email = email;
        }
        if let Some(phone) = self.phone {
            person.phone = phone;
        }
        if let Some(desktop_login) = self.desktop_login {
            person.desktop_login = desktop_login;
        }
        if let Some(timezone) = self.timezone {
            person.timezone = timezone;
        }
        if let Some(locale) = self.locale {
            person.locale = locale;
        }
        if let Some(has_avatar) = self.has_avatar {
            person.has_avatar = has_avatar;
        }
        if let Some(expiration_date) = self.expiration_date {
            person.expiration_date = expiration_date;
        }
        if let Some(role) = self.role {
            person.role = role;
        }
        if let Some(departments) = departments {
            person.departments = departments;
        }
        if let Some(active) = self.active {
            person.active = active;
        }
        if let Some(is_bot) = self.is_bot {
            person.is_bot = is_bot;
        }
        if let Some(archived) = self.archived {
            person.archived = archived;
        }
        if let Some(attempts) = self.login_failed_attempts {
            person.login_failed_attempts = attempts;
        }
        if let Some(last_login_failed) = self.last_login_failed {
            person.last_login_failed = last_login_failed;
        }
        if let Some(from_ldap) = self.is_generated_from_ldap {
            person.is_generated_from_ldap = from_ldap;
        }
        if let Some(ldap_uid) = self.ldap_uid {
            person.ldap_uid = ldap_uid;
        }
        if let Some(last_presence) = self.last_presence {
            person.last_presence = last_presence;
        }
        person.updated_at = Utc::now();
    }

    fn set(&mut self, field: PersonField, value: Value) -> Result<(), PersonError> {
        match field {
            PersonField::FirstName => self.first_name = Some(string(field, value)?),
            PersonField::LastName => self.last_name = Some(string(field, value)?),
            PersonField::Email => self.email = Some(email(value)?),
            PersonField::Phone => self.phone = Some(nullable_string(field, value)?),
            PersonField::DesktopLogin => {
                self.desktop_login = Some(nullable_string(field, value)?);
            }
            PersonField::Timezone => self.timezone = Some(nullable_string(field, value)?),
            PersonField::Locale => self.locale = Some(nullable_string(field, value)?),
            PersonField::HasAvatar => self.has_avatar = Some(boolean(field, &value)?),
            PersonField::ExpirationDate => self.expiration_date = Some(date(field, value)?),
            PersonField::Role => self.role = Some(role(value)?),
            PersonField::Departments => self.departments = Some(id_list(field, value)?),
            PersonField::Active => self.active = Some(boolean(field, &value)?),
            PersonField::IsBot => self.is_bot = Some(boolean(field, &value)?),
            PersonField::Archived => self.archived = Some(boolean(field, &value)?),
            PersonField::LoginFailedAttempts => {
                self.login_failed_attempts = Some(counter(field, &value)?);
            }
            PersonField::LastLoginFailed => {
                self.last_login_failed = Some(timestamp(field, value)?);
            }
            PersonField::IsGeneratedFromLdap => {
                self.is_generated_from_ldap = Some(boolean(field, &value)?);
            }
            PersonField::LdapUid => self.ldap_uid = Some(nullable_string(field, value)?),
            PersonField::LastPresence => self.last_presence = Some(date(field, value)?),
            PersonField::Id
            | PersonField::Password
            | PersonField::Jti
            | PersonField::CreatedAt
            | PersonField::UpdatedAt => {
                return Err(PersonError::wrong_parameter(format!(
                    "{field} cannot be changed"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(field: PersonField, expected: &str) -> PersonError {
    PersonError::wrong_parameter(format!("{field} must be {expected}"))
}

fn string(field: PersonField, value: Value) -> Result<String, PersonError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(invalid(field, "a string")),
    }
}

fn nullable_string(field: PersonField, value: Value) -> Result<Option<String>, PersonError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(invalid(field, "a string or null")),
    }
}

fn email(value: Value) -> Result<String, PersonError> {
    let email = string(PersonField::Email, value)?;
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(invalid(PersonField::Email, "a valid email address"));
    }
    Ok(trimmed.to_string())
}

fn boolean(field: PersonField, value: &Value) -> Result<bool, PersonError> {
    value.as_bool().ok_or_else(|| invalid(field, "a boolean"))
}

fn counter(field: PersonField, value: &Value) -> Result<i32, PersonError> {
    value
        .as_u64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| invalid(field, "a non-negative integer"))
}

fn role(value: Value) -> Result<Role, PersonError> {
    let raw = string(PersonField::Role, value)?;
    raw.parse()
        .map_err(|_| PersonError::wrong_parameter(format!("{raw} is not a valid role")))
}

fn date(field: PersonField, value: Value) -> Result<Option<NaiveDate>, PersonError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .ok()
            .filter(|date| (1..=9999).contains(&date.year()))
            .map(Some)
            .ok_or_else(|| invalid(field, "a date formatted as YYYY-MM-DD")),
        _ => Err(invalid(field, "a date or null")),
    }
}

fn timestamp(field: PersonField, value: Value) -> Result<Option<DateTime<Utc>>, PersonError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| invalid(field, "an RFC 3339 timestamp")),
        _ => Err(invalid(field, "a timestamp or null")),
    }
}

fn id_list(field: PersonField, value: Value) -> Result<Vec<String>, PersonError> {
    let Value::Array(items) = value else {
        return Err(invalid(field, "a list of ids"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(invalid(field, "a list of ids")),
        })
        .collect()
}
