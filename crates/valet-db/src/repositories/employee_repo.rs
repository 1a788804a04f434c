//! Employee repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use valet_core::{
    models::Employee,
    traits::{EmployeeRepository, Repository},
    AppError, AppResult,
};

const EMPLOYEE_COLUMNS: &str =
    "id, full_name, email, phone, position, is_active, created_at, updated_at";

/// PostgreSQL implementation of EmployeeRepository
pub struct PgEmployeeRepository {
    pool: PgPool,
}

impl PgEmployeeRepository {
    /// Create a new employee repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Employee, i32> for PgEmployeeRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Employee>> {
        debug!("Finding employee by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding employee {}: {}", id, e);
            AppError::Database(format!("Failed to find employee: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Employee>> {
        let rows = sqlx::query_as::<sqlx::Postgres, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees \
             ORDER BY full_name LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding employees: {}", e);
            AppError::Database(format!("Failed to fetch employees: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting employees: {}", e);
                AppError::Database(format!("Failed to count employees: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Employee) -> AppResult<Employee> {
        debug!("Creating employee: {}", entity.full_name);

        let row = sqlx::query_as::<sqlx::Postgres, EmployeeRow>(&format!(
            r#"
            INSERT INTO employees (full_name, email, phone, position, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(&entity.full_name)
        .bind(&entity.email)
        .bind(&entity.phone)
        .bind(&entity.position)
        .bind(entity.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating employee: {}", e);
            AppError::Database(format!("Failed to create employee: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Employee) -> AppResult<Employee> {
        debug!("Updating employee: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, EmployeeRow>(&format!(
            r#"
            UPDATE employees
            SET full_name = $2,
                email = $3,
                phone = $4,
                position = $5,
                is_active = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(entity.id)
        .bind(&entity.full_name)
        .bind(&entity.email)
        .bind(&entity.phone)
        .bind(&entity.position)
        .bind(entity.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::EmployeeNotFound(entity.id.to_string()),
            _ => {
                error!("Database error updating employee {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update employee: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting employee: {}", id);

        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting employee {}: {}", id, e);
                AppError::Database(format!("Failed to delete employee: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        debug!("Finding employee by email");

        let result = sqlx::query_as::<sqlx::Postgres, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding employee by email: {}", e);
            AppError::Database(format!("Failed to find employee by email: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: i32,
    full_name: String,
    email: String,
    phone: Option<String>,
    position: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            position: row.position,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
