//! Postgres repository for departments.

use super::store_error;
use async_trait::async_trait;
use cutlist_core::{DepartmentId, Result};
use cutlist_people::{Department, DepartmentDirectory, StoreError};
use sqlx::{FromRow, PgPool};

/// Row type for department queries.
#[derive(FromRow)]
struct DepartmentRow {
    id: String,
    name: String,
    color: String,
    archived: bool,
}

impl DepartmentRow {
    fn try_into_department(self) -> Result<Department, StoreError> {
        let id: DepartmentId = self.id.parse().map_err(|e| StoreError::Decode {
            details: format!("invalid department id '{}': {e}", self.id),
        })?;
        Ok(Department {
            id,
            name: self.name,
            color: self.color,
            archived: self.archived,
        })
    }
}

/// Repository for department operations.
#[derive(Clone)]
pub struct DepartmentRepository {
    pool: PgPool,
}

impl DepartmentRepository {
    /// Creates a new department repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a department.
    pub async fn create(&self, department: &Department) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO departments (id, name, color, archived)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(department.id.to_string())
        .bind(&department.name)
        .bind(&department.color)
        .bind(department.archived)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}

#[async_trait]
impl DepartmentDirectory for DepartmentRepository {
    async fn find_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        let row: Option<DepartmentRow> = sqlx::query_as(
            r#"
            SELECT id, name, color, archived
            FROM departments
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(DepartmentRow::try_into_department).transpose()
    }
}
