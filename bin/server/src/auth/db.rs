//! Database repository for sessions and the access-token issuer.

use super::SessionStore;
use crate::db::store_error;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use cutlist_core::{PersonId, Result};
use cutlist_people::{Person, StoreError, TokenIssuer};
use cutlist_platform_access::{Session, SessionId, SessionKind};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::debug;

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    person_id: String,
    kind: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, StoreError> {
        let person_id: PersonId = self.person_id.parse().map_err(|e| StoreError::Decode {
            details: format!("invalid person id '{}': {e}", self.person_id),
        })?;
        Ok(Session::with_all_fields(
            SessionId::new(self.id),
            person_id,
            SessionKind::from_stored(&self.kind),
            self.created_at,
            self.expires_at,
        ))
    }
}

/// Repository for session operations.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes expired sessions.
    pub async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, person_id, kind, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(SessionRow::try_into_session).transpose()
    }

    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, person_id, kind, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.person_id().to_string())
        .bind(session.kind().as_str())
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}

/// Generates a unique session ID using ULID.
pub fn generate_session_id() -> SessionId {
    SessionId::new(ulid::Ulid::new().to_string())
}

/// Mints access tokens as sessions of kind [`SessionKind::AccessToken`].
///
/// A token expires at the end of the person's expiration date (UTC), or
/// after the configured duration when the person has none.
pub struct SessionTokenIssuer {
    sessions: Arc<dyn SessionStore>,
    default_duration: Duration,
}

impl SessionTokenIssuer {
    /// Creates an issuer storing tokens in `sessions`.
    pub fn new(sessions: Arc<dyn SessionStore>, default_duration: Duration) -> Self {
        Self {
            sessions,
            default_duration,
        }
    }

    fn expiry_for(&self, person: &Person, now: DateTime<Utc>) -> DateTime<Utc> {
        person
            .expiration_date
            .map(|date| {
                date.and_time(NaiveTime::MIN)
                    .and_utc()
                    .checked_add_signed(Duration::days(1))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            })
            .unwrap_or_else(|| {
                now.checked_add_signed(self.default_duration)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            })
    }
}

#[async_trait]
impl TokenIssuer for SessionTokenIssuer {
    async fn issue_for(&self, person: &Person) -> Result<String, StoreError> {
        let now = Utc::now();
        let session = Session::with_all_fields(
            generate_session_id(),
            person.id,
            SessionKind::AccessToken,
            now,
            self.expiry_for(person, now),
        );
        self.sessions.create(&session).await?;
        debug!(person_id = %person.id, expires_at = %session.expires_at(), "stored access token");
        Ok(session.id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::InMemorySessions;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn token_expires_after_expiration_date() {
        let sessions = Arc::new(InMemorySessions::default());
        let issuer = SessionTokenIssuer::new(sessions.clone(), Duration::days(7));
        let mut person = Person::new("John", "Doe", "john.doe@example.com");
        person.expiration_date = NaiveDate::from_ymd_opt(2030, 1, 1);

        let token = issuer.issue_for(&person).await.expect("issue");

        let stored = sessions
            .find(&SessionId::new(token))
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored.kind(), SessionKind::AccessToken);
        assert_eq!(stored.person_id(), person.id);
        assert_eq!(
            stored.expires_at().date_naive(),
            NaiveDate::from_ymd_opt(2030, 1, 2).expect("date")
        );
    }

    #[tokio::test]
    async fn token_without_expiration_date_uses_default_duration() {
        let sessions = Arc::new(InMemorySessions::default());
        let issuer = SessionTokenIssuer::new(sessions.clone(), Duration::days(7));
        let person = Person::new("John", "Doe", "john.doe@example.com");

        issuer.issue_for(&person).await.expect("issue");

        let all = sessions.all().await;
        assert_eq!(all.len(), 1);
        let lifetime = all[0].expires_at() - all[0].created_at();
        assert_eq!(lifetime, Duration::days(7));
    }

    #[tokio::test]
    async fn token_for_last_representable_date_saturates() {
        let sessions = Arc::new(InMemorySessions::default());
        let issuer = SessionTokenIssuer::new(sessions.clone(), Duration::days(7));
        let mut person = Person::new("John", "Doe", "john.doe@example.com");
        person.expiration_date = Some(NaiveDate::MAX);

        issuer.issue_for(&person).await.expect("issue");

        let all = sessions.all().await;
        assert_eq!(all[0].expires_at(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
