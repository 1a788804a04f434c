//! Session log repository implementation
//!
//! Append-only storage for the session audit trail. Entries are joined with
//! the employees table on read so the UI can show who did what.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use valet_core::{
    models::{SessionAction, SessionLogEntry, SessionLogView},
    traits::SessionLogRepository,
    AppError, AppResult,
};

/// PostgreSQL implementation of SessionLogRepository
pub struct PgSessionLogRepository {
    pool: PgPool,
}

impl PgSessionLogRepository {
    /// Create a new session log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse a stored action code, falling back to `Created`
    fn parse_action(s: &str) -> SessionAction {
        match s.to_lowercase().as_str() {
            "created" => SessionAction::Created,
            "car_accepted" => SessionAction::CarAccepted,
            "en_route" => SessionAction::EnRoute,
            "parked" => SessionAction::Parked,
            "return_requested" => SessionAction::ReturnRequested,
            "return_accepted" => SessionAction::ReturnAccepted,
            "return_started" => SessionAction::ReturnStarted,
            "return_delivering" => SessionAction::ReturnDelivering,
            "completed" => SessionAction::Completed,
            "cancelled" => SessionAction::Cancelled,
            "cost_calculated" => SessionAction::CostCalculated,
            "payment_received" => SessionAction::PaymentReceived,
            _ => SessionAction::Created,
        }
    }
}

#[async_trait]
impl SessionLogRepository for PgSessionLogRepository {
    #[instrument(skip(self, entry))]
    async fn append(&self, entry: &SessionLogEntry) -> AppResult<SessionLogEntry> {
        debug!(
            "Appending log entry for session {}: {}",
            entry.session_id, entry.action
        );

        let row = sqlx::query_as::<sqlx::Postgres, LogRow>(
            r#"
            INSERT INTO session_logs (session_id, employee_id, action, description, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, session_id, employee_id, action, description, details, created_at
            "#,
        )
        .bind(entry.session_id)
        .bind(entry.employee_id)
        .bind(entry.action.to_string())
        .bind(&entry.description)
        .bind(&entry.details)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error appending log entry: {}", e);
            AppError::Database(format!("Failed to append log entry: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_for_session(&self, session_id: i32) -> AppResult<Vec<SessionLogView>> {
        debug!("Listing log entries for session: {}", session_id);

        let rows = sqlx::query_as::<sqlx::Postgres, LogViewRow>(
            r#"
            SELECT l.id, l.action, l.description, l.details, l.created_at,
                   e.full_name AS employee_name
            FROM session_logs l
            LEFT JOIN employees e ON e.id = l.employee_id
            WHERE l.session_id = $1
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing log entries: {}", e);
            AppError::Database(format!("Failed to list log entries: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: i64,
    session_id: i32,
    employee_id: Option<i32>,
    action: String,
    description: String,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LogRow> for SessionLogEntry {
    fn from(row: LogRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            employee_id: row.employee_id,
            action: PgSessionLogRepository::parse_action(&row.action),
            description: row.description,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

/// Helper struct for the joined display query
#[derive(Debug, sqlx::FromRow)]
struct LogViewRow {
    id: i64,
    action: String,
    description: String,
    details: Option<String>,
    created_at: DateTime<Utc>,
    employee_name: Option<String>,
}

impl From<LogViewRow> for SessionLogView {
    fn from(row: LogViewRow) -> Self {
        Self {
            id: row.id,
            action: PgSessionLogRepository::parse_action(&row.action),
            description: row.description,
            employee_name: row.employee_name.unwrap_or_else(|| "System".to_string()),
            timestamp: row.created_at,
            details: row.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(
            PgSessionLogRepository::parse_action("payment_received"),
            SessionAction::PaymentReceived
        );
        assert_eq!(
            PgSessionLogRepository::parse_action("cost_calculated"),
            SessionAction::CostCalculated
        );
        assert_eq!(
            PgSessionLogRepository::parse_action("garbage"),
            SessionAction::Created
        );
    }

    #[test]
    fn test_view_falls_back_to_system() {
        let row = LogViewRow {
            id: 1,
            action: "created".to_string(),
            description: "Valet session created".to_string(),
            details: None,
            created_at: Utc::now(),
            employee_name: None,
        };
        let view: SessionLogView = row.into();
        assert_eq!(view.employee_name, "System");
    }
}
