//! Postgres repository for persons.

use super::store_error;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use cutlist_core::{DepartmentId, PersonId, Result};
use cutlist_people::{DeletionCascade, Person, PersonFilter, PersonStore, StoreError};
use cutlist_platform_access::Role;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::BTreeSet;
use tracing::debug;

const SELECT_PERSON: &str = r#"
    SELECT p.id, p.first_name, p.last_name, p.email, p.phone, p.desktop_login,
           p.password, p.jti, p.role, p.active, p.is_bot, p.archived,
           p.expiration_date, p.last_login_failed, p.login_failed_attempts,
           p.is_generated_from_ldap, p.ldap_uid, p.last_presence, p.timezone,
           p.locale, p.has_avatar, p.created_at, p.updated_at,
           COALESCE(
               ARRAY_AGG(pd.department_id) FILTER (WHERE pd.department_id IS NOT NULL),
               '{}'
           ) AS department_ids
    FROM persons p
    LEFT JOIN person_departments pd ON pd.person_id = p.id
"#;

/// Row type for person queries.
#[derive(FromRow)]
struct PersonRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    desktop_login: Option<String>,
    password: Option<String>,
    jti: Option<String>,
    role: String,
    active: bool,
    is_bot: bool,
    archived: bool,
    expiration_date: Option<NaiveDate>,
    last_login_failed: Option<DateTime<Utc>>,
    login_failed_attempts: i32,
    is_generated_from_ldap: bool,
    ldap_uid: Option<String>,
    last_presence: Option<NaiveDate>,
    timezone: Option<String>,
    locale: Option<String>,
    has_avatar: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    department_ids: Vec<String>,
}

fn decode_error(what: &str, value: &str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Decode {
        details: format!("invalid {what} '{value}': {reason}"),
    }
}

impl PersonRow {
    fn try_into_person(self) -> Result<Person, StoreError> {
        let id: PersonId = self
            .id
            .parse()
            .map_err(|e| decode_error("person id", &self.id, e))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|e| decode_error("role", &self.role, e))?;
        let departments = self
            .department_ids
            .iter()
            .map(|raw| {
                raw.parse::<DepartmentId>()
                    .map_err(|e| decode_error("department id", raw, e))
            })
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        Ok(Person {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            desktop_login: self.desktop_login,
            password: self.password,
            jti: self.jti,
            role,
            departments,
            active: self.active,
            is_bot: self.is_bot,
            archived: self.archived,
            expiration_date: self.expiration_date,
            last_login_failed: self.last_login_failed,
            login_failed_attempts: self.login_failed_attempts,
            is_generated_from_ldap: self.is_generated_from_ldap,
            ldap_uid: self.ldap_uid,
            last_presence: self.last_presence,
            timezone: self.timezone,
            locale: self.locale,
            has_avatar: self.has_avatar,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for person operations.
#[derive(Clone)]
pub struct PersonRepository {
    pool: PgPool,
}

impl PersonRepository {
    /// Creates a new person repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists active persons ordered by name.
    pub async fn active_persons(&self) -> Result<Vec<Person>, StoreError> {
        self.list(&PersonFilter {
            active: Some(true),
            ..PersonFilter::default()
        })
        .await
    }
}

#[async_trait]
impl PersonStore for PersonRepository {
    async fn find(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_PERSON);
        query
            .push(" WHERE p.id = ")
            .push_bind(id.to_string())
            .push(" GROUP BY p.id");
        let row: Option<PersonRow> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(PersonRow::try_into_person).transpose()
    }

    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_PERSON);
        query.push(" WHERE TRUE");
        if let Some(active) = filter.active {
            query.push(" AND p.active = ").push_bind(active);
        }
        if let Some(is_bot) = filter.is_bot {
            query.push(" AND p.is_bot = ").push_bind(is_bot);
        }
        if let Some(archived) = filter.archived {
            query.push(" AND p.archived = ").push_bind(archived);
        }
        if let Some(role) = filter.role {
            query.push(" AND p.role = ").push_bind(role.as_str());
        }
        if let Some(email) = &filter.email {
            query
                .push(" AND LOWER(p.email) = LOWER(")
                .push_bind(email.clone())
                .push(")");
        }
        if let Some(department_id) = filter.department_id {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM person_departments f \
                     WHERE f.person_id = p.id AND f.department_id = ",
                )
                .push_bind(department_id.to_string())
                .push(")");
        }
        query.push(" GROUP BY p.id ORDER BY p.last_name, p.first_name");
        if let Some(limit) = filter.limit {
            let offset = i64::try_from(filter.offset()).unwrap_or(i64::MAX);
            query
                .push(" LIMIT ")
                .push_bind(i64::from(limit))
                .push(" OFFSET ")
                .push_bind(offset);
        }

        let rows: Vec<PersonRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        rows.into_iter().map(PersonRow::try_into_person).collect()
    }

    async fn save(&self, person: &Person) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        sqlx::query(
            r#"
            INSERT INTO persons (
                id, first_name, last_name, email, phone, desktop_login, password, jti,
                role, active, is_bot, archived, expiration_date, last_login_failed,
                login_failed_attempts, is_generated_from_ldap, ldap_uid, last_presence,
                timezone, locale, has_avatar, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23)
            ON CONFLICT (id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                desktop_login = EXCLUDED.desktop_login,
                password = EXCLUDED.password,
                jti = EXCLUDED.jti,
                role = EXCLUDED.role,
                active = EXCLUDED.active,
                is_bot = EXCLUDED.is_bot,
                archived = EXCLUDED.archived,
                expiration_date = EXCLUDED.expiration_date,
                last_login_failed = EXCLUDED.last_login_failed,
                login_failed_attempts = EXCLUDED.login_failed_attempts,
                is_generated_from_ldap = EXCLUDED.is_generated_from_ldap,
                ldap_uid = EXCLUDED.ldap_uid,
                last_presence = EXCLUDED.last_presence,
                timezone = EXCLUDED.timezone,
                locale = EXCLUDED.locale,
                has_avatar = EXCLUDED.has_avatar,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(person.id.to_string())
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(&person.email)
        .bind(&person.phone)
        .bind(&person.desktop_login)
        .bind(&person.password)
        .bind(&person.jti)
        .bind(person.role.as_str())
        .bind(person.active)
        .bind(person.is_bot)
        .bind(person.archived)
        .bind(person.expiration_date)
        .bind(person.last_login_failed)
        .bind(person.login_failed_attempts)
        .bind(person.is_generated_from_ldap)
        .bind(&person.ldap_uid)
        .bind(person.last_presence)
        .bind(&person.timezone)
        .bind(&person.locale)
        .bind(person.has_avatar)
        .bind(person.created_at)
        .bind(person.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        sqlx::query("DELETE FROM person_departments WHERE person_id = $1")
            .bind(person.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        for department_id in &person.departments {
            sqlx::query("INSERT INTO person_departments (person_id, department_id) VALUES ($1, $2)")
                .bind(person.id.to_string())
                .bind(department_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;
        debug!(person_id = %person.id, "saved person");
        Ok(())
    }

    async fn count_active_humans(&self) -> Result<u64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM persons WHERE active AND NOT is_bot")
                .fetch_one(&self.pool)
                .await
                .map_err(store_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl DeletionCascade for PersonRepository {
    async fn remove_person(&self, id: PersonId, force: bool) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let assignments: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM task_assignees WHERE person_id = $1")
                .bind(id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(store_error)?;
        if assignments > 0 && !force {
            return Err(StoreError::DeletionBlocked {
                relation: "task assignments".to_string(),
                count: u64::try_from(assignments).unwrap_or(0),
            }
            .into());
        }

        sqlx::query("DELETE FROM task_assignees WHERE person_id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        debug!(person_id = %id, force, "removed person and dependent rows");
        Ok(())
    }
}
