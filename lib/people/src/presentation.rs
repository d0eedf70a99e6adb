//! Serialized views of a person.
//!
//! Department ids are a relation: they are only included when `relations`
//! is requested.

use crate::person::Person;
use crate::policy::ViewLevel;
use serde_json::{Map, Value, json};

/// Serializes `person` at the given view level.
#[must_use]
pub fn present(person: &Person, level: ViewLevel, relations: bool) -> Map<String, Value> {
    let mut out = match level {
        ViewLevel::Full => {
            let mut out = safe(person);
            out.insert("password".to_string(), json!(person.password));
            out
        }
        ViewLevel::Safe => safe(person),
        ViewLevel::Minimal => minimal(person),
    };
    if relations {
        out.insert("departments".to_string(), department_ids(person));
    }
    out
}

/// Department ids of `person` as a JSON array of strings.
#[must_use]
pub fn department_ids(person: &Person) -> Value {
    Value::Array(
        person
            .departments
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect(),
    )
}

fn safe(person: &Person) -> Map<String, Value> {
    let value = json!({
        "id": person.id,
        "type": "Person",
        "first_name": person.first_name,
        "last_name": person.last_name,
        "full_name": person.full_name(),
        "email": person.email,
        "phone": person.phone,
        "desktop_login": person.desktop_login,
        "role": person.role,
        "active": person.active,
        "is_bot": person.is_bot,
        "archived": person.archived,
        "expiration_date": person.expiration_date,
        "last_login_failed": person.last_login_failed,
        "login_failed_attempts": person.login_failed_attempts,
        "is_generated_from_ldap": person.is_generated_from_ldap,
        "ldap_uid": person.ldap_uid,
        "last_presence": person.last_presence,
        "timezone": person.timezone,
        "locale": person.locale,
        "has_avatar": person.has_avatar,
        "created_at": person.created_at,
        "updated_at": person.updated_at,
    });
    into_map(value)
}

fn minimal(person: &Person) -> Map<String, Value> {
    let value = json!({
        "id": person.id,
        "type": "Person",
        "first_name": person.first_name,
        "last_name": person.last_name,
        "full_name": person.full_name(),
        "desktop_login": person.desktop_login,
        "role": person.role,
        "active": person.active,
        "is_bot": person.is_bot,
        "has_avatar": person.has_avatar,
    });
    into_map(value)
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
