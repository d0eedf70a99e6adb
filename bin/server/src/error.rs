//! HTTP mapping of domain errors.
//!
//! Handlers return [`ApiError`]; it renders as a status code with a
//! `{"message": ...}` JSON body.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cutlist_people::PersonError;
use cutlist_platform_access::AuthenticationError;
use rootcause::Report;
use serde_json::json;
use std::fmt;

/// An error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates an error response.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Response for failures the caller cannot act on.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message sent to the client.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// Status code of a person error.
#[must_use]
pub fn person_status(error: &PersonError) -> StatusCode {
    match error {
        PersonError::NotFound { .. } => StatusCode::NOT_FOUND,
        PersonError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        PersonError::WrongParameter { .. }
        | PersonError::PersonInProtectedAccounts { .. }
        | PersonError::DepartmentNotFound { .. }
        | PersonError::ModelWithRelations { .. }
        | PersonError::Database { .. } => StatusCode::BAD_REQUEST,
        PersonError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
    }
}

impl From<Report<PersonError>> for ApiError {
    fn from(report: Report<PersonError>) -> Self {
        let error = report.current_context();
        let status = person_status(error);
        tracing::debug!(%status, %error, "person request failed");
        Self::new(status, error.to_string())
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(error: AuthenticationError) -> Self {
        tracing::debug!(%error, "authentication failed");
        let message = match error {
            AuthenticationError::MissingToken => "Missing access token",
            AuthenticationError::SessionExpired { .. } => "Session expired",
            AuthenticationError::InvalidSession { .. }
            | AuthenticationError::PersonNotFound { .. }
            | AuthenticationError::PersonInactive { .. } => "Invalid access token",
        };
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}
