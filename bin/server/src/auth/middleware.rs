//! Authentication extractor for Axum.

use super::AppState;
use crate::error::ApiError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use cutlist_platform_access::{AuthenticationError, Caller, SessionId};
use std::sync::Arc;
use tracing::{error, warn};

/// Session cookie name.
const SESSION_COOKIE: &str = "session";

/// Extractor for requiring an authenticated caller.
///
/// The token is read from `Authorization: Bearer <token>`, falling back to
/// the `session` cookie.
pub struct RequireAuth(pub Caller);

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);

        let token = match bearer_token(parts) {
            Some(token) => token,
            None => {
                let jar = CookieJar::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::internal())?;
                jar.get(SESSION_COOKIE)
                    .map(|cookie| cookie.value().to_string())
                    .ok_or(AuthenticationError::MissingToken)?
            }
        };
        let session_id = SessionId::new(token);

        let session = app_state
            .sessions
            .find(&session_id)
            .await
            .map_err(|report| {
                error!(error = %report.current_context(), "session lookup failed");
                ApiError::internal()
            })?
            .ok_or_else(|| AuthenticationError::InvalidSession {
                session_id: session_id.to_string(),
            })?;

        if session.is_expired() {
            if let Err(report) = app_state.sessions.delete(&session_id).await {
                warn!(error = %report.current_context(), "failed to delete expired session");
            }
            return Err(AuthenticationError::SessionExpired {
                session_id: session_id.to_string(),
            }
            .into());
        }

        let person_id = session.person_id();
        let person = app_state
            .persons
            .get(person_id)
            .await
            .map_err(|report| {
                error!(%person_id, error = %report.current_context(), "caller lookup failed");
                ApiError::internal()
            })?
            .ok_or(AuthenticationError::PersonNotFound { person_id })?;
        if !person.active {
            return Err(AuthenticationError::PersonInactive { person_id }.into());
        }

        Ok(RequireAuth(Caller::new(person_id, person.role)))
    }
}
