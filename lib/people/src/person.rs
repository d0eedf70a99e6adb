//! Person and department records.

use chrono::{DateTime, NaiveDate, Utc};
use cutlist_core::{DepartmentId, PersonId};
use cutlist_platform_access::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A member of the studio, an external account or a bot.
///
/// `password` holds the password hash and `jti` the identifier of the last
/// issued login token; neither ever leaves the service except the hash in
/// the admin-only full view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub desktop_login: Option<String>,
    pub password: Option<String>,
    pub jti: Option<String>,
    pub role: Role,
    pub departments: BTreeSet<DepartmentId>,
    pub active: bool,
    pub is_bot: bool,
    pub archived: bool,
    /// Last day an access token issued for this person stays valid.
    pub expiration_date: Option<NaiveDate>,
    pub last_login_failed: Option<DateTime<Utc>>,
    pub login_failed_attempts: i32,
    pub is_generated_from_ldap: bool,
    pub ldap_uid: Option<String>,
    pub last_presence: Option<NaiveDate>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub has_avatar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Creates an active regular user with no optional data.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PersonId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            desktop_login: None,
            password: None,
            jti: None,
            role: Role::User,
            departments: BTreeSet::new(),
            active: true,
            is_bot: false,
            archived: false,
            expiration_date: None,
            last_login_failed: None,
            login_failed_attempts: 0,
            is_generated_from_ldap: false,
            ldap_uid: None,
            last_presence: None,
            timezone: None,
            locale: None,
            has_avatar: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns "first last", trimmed when either part is empty.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Returns true if this active person counts towards the user limit.
    #[must_use]
    pub fn counts_towards_user_limit(&self) -> bool {
        self.active && !self.is_bot
    }
}

/// A studio department (animation, modeling, compositing...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub color: String,
    pub archived: bool,
}

impl Department {
    /// Creates an unarchived department.
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: DepartmentId::new(),
            name: name.into(),
            color: color.into(),
            archived: false,
        }
    }
}

/// Filters accepted by the person listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub active: Option<bool>,
    pub is_bot: Option<bool>,
    pub archived: Option<bool>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub department_id: Option<DepartmentId>,
    /// 1-based page number; ignored without `limit`.
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PersonFilter {
    /// Returns true if `person` satisfies every set criterion.
    ///
    /// Pagination is not part of matching.
    #[must_use]
    pub fn matches(&self, person: &Person) -> bool {
        self.active.is_none_or(|active| person.active == active)
            && self.is_bot.is_none_or(|is_bot| person.is_bot == is_bot)
            && self
                .archived
                .is_none_or(|archived| person.archived == archived)
            && self.role.is_none_or(|role| person.role == role)
            && self
                .email
                .as_deref()
                .is_none_or(|email| person.email.eq_ignore_ascii_case(email))
            && self
                .department_id
                .is_none_or(|department| person.departments.contains(&department))
    }

    /// Number of matching rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        match (self.page, self.limit) {
            (Some(page), Some(limit)) => u64::from(page.saturating_sub(1)) * u64::from(limit),
            _ => 0,
        }
    }
}
