//! Database repositories for the cutlist server.
//!
//! This module provides data access for:
//! - Persons and their department links
//! - Departments

pub mod department;
pub mod person;

pub use department::DepartmentRepository;
pub use person::PersonRepository;

use cutlist_people::StoreError;

/// Classifies a sqlx failure.
///
/// Statement errors keep the database's own message; it is sent back to
/// the client as is.
pub(crate) fn store_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Database(db) => StoreError::Statement {
            details: db.message().to_string(),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Connection {
            details: error.to_string(),
        },
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => StoreError::Decode {
            details: error.to_string(),
        },
        other => StoreError::Statement {
            details: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_connection_failures() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Connection { .. }
        ));
    }

    #[test]
    fn missing_rows_are_statement_failures() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Statement { .. }
        ));
    }
}
