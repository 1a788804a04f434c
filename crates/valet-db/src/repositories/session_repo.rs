//! Valet session repository implementation
//!
//! Provides PostgreSQL-backed storage for valet sessions, including the
//! cached-cost columns, the payment ledger columns and the bulk cost reset
//! used when tariff pricing changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};
use valet_core::{
    models::{PaymentStatus, SessionStatus, ValetSession},
    traits::{CostUpdate, PaymentOutcome, Repository, SessionPatch, SessionRepository},
    AppError, AppResult,
};

const SESSION_COLUMNS: &str = r#"
    id, employee_id, request_accepted_by_id,
    car_number, car_model, car_color,
    client_name, client_phone, client_card_number,
    parking_spot, parking_card, has_subscription, notes,
    status, session_number, tariff_id,
    car_photos_urls, parking_photos_urls,
    return_start_photos_urls, return_delivery_photos_urls,
    calculated_cost, cost_calculation_details, cost_calculated_at, is_cost_final,
    payment_status, payment_method, paid_amount, payment_date, payment_reference,
    created_at, updated_at
"#;

/// PostgreSQL implementation of SessionRepository
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse session status from string
    fn parse_status(s: &str) -> SessionStatus {
        SessionStatus::from_str(s).unwrap_or(SessionStatus::Created)
    }

    /// Parse payment status from string
    fn parse_payment_status(s: &str) -> PaymentStatus {
        PaymentStatus::from_str(s).unwrap_or(PaymentStatus::Pending)
    }
}

#[async_trait]
impl Repository<ValetSession, i32> for PgSessionRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<ValetSession>> {
        debug!("Finding session by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding session {}: {}", id, e);
            AppError::Database(format!("Failed to find session: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<ValetSession>> {
        debug!("Finding all sessions with limit {} offset {}", limit, offset);

        let rows = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding sessions: {}", e);
            AppError::Database(format!("Failed to fetch sessions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM valet_sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting sessions: {}", e);
                AppError::Database(format!("Failed to count sessions: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &ValetSession) -> AppResult<ValetSession> {
        debug!("Creating session for car: {}", entity.car_number);

        let row = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            r#"
            INSERT INTO valet_sessions (
                employee_id, request_accepted_by_id,
                car_number, car_model, car_color,
                client_name, client_phone, client_card_number,
                parking_spot, parking_card, has_subscription, notes,
                status, session_number, tariff_id,
                car_photos_urls, parking_photos_urls,
                return_start_photos_urls, return_delivery_photos_urls,
                calculated_cost, cost_calculation_details, cost_calculated_at,
                is_cost_final, payment_status, paid_amount
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(entity.employee_id)
        .bind(entity.request_accepted_by_id)
        .bind(&entity.car_number)
        .bind(&entity.car_model)
        .bind(&entity.car_color)
        .bind(&entity.client_name)
        .bind(&entity.client_phone)
        .bind(&entity.client_card_number)
        .bind(&entity.parking_spot)
        .bind(&entity.parking_card)
        .bind(entity.has_subscription)
        .bind(&entity.notes)
        .bind(entity.status.to_string())
        .bind(&entity.session_number)
        .bind(entity.tariff_id)
        .bind(&entity.car_photos_urls)
        .bind(&entity.parking_photos_urls)
        .bind(&entity.return_start_photos_urls)
        .bind(&entity.return_delivery_photos_urls)
        .bind(entity.calculated_cost)
        .bind(&entity.cost_calculation_details)
        .bind(entity.cost_calculated_at)
        .bind(entity.is_cost_final)
        .bind(entity.payment_status.to_string())
        .bind(entity.paid_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating session: {}", e);
            AppError::Database(format!("Failed to create session: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &ValetSession) -> AppResult<ValetSession> {
        debug!("Updating session: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            r#"
            UPDATE valet_sessions
            SET employee_id = $2,
                request_accepted_by_id = $3,
                car_number = $4,
                car_model = $5,
                car_color = $6,
                client_name = $7,
                client_phone = $8,
                client_card_number = $9,
                parking_spot = $10,
                parking_card = $11,
                has_subscription = $12,
                notes = $13,
                status = $14,
                tariff_id = $15,
                car_photos_urls = $16,
                parking_photos_urls = $17,
                return_start_photos_urls = $18,
                return_delivery_photos_urls = $19,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(entity.id)
        .bind(entity.employee_id)
        .bind(entity.request_accepted_by_id)
        .bind(&entity.car_number)
        .bind(&entity.car_model)
        .bind(&entity.car_color)
        .bind(&entity.client_name)
        .bind(&entity.client_phone)
        .bind(&entity.client_card_number)
        .bind(&entity.parking_spot)
        .bind(&entity.parking_card)
        .bind(entity.has_subscription)
        .bind(&entity.notes)
        .bind(entity.status.to_string())
        .bind(entity.tariff_id)
        .bind(&entity.car_photos_urls)
        .bind(&entity.parking_photos_urls)
        .bind(&entity.return_start_photos_urls)
        .bind(&entity.return_delivery_photos_urls)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::SessionNotFound(entity.id.to_string()),
            _ => {
                error!("Database error updating session {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update session: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting session: {}", id);

        let result = sqlx::query("DELETE FROM valet_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting session {}: {}", id, e);
                AppError::Database(format!("Failed to delete session: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    #[instrument(skip(self))]
    async fn find_active_by_card(&self, card_number: &str) -> AppResult<Option<ValetSession>> {
        debug!("Finding active session for card: {}", card_number);

        let result = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions \
             WHERE client_card_number = $1 \
                 AND status NOT IN ('completed', 'cancelled') \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(card_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding session by card: {}", e);
            AppError::Database(format!("Failed to find session by card: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_parked_by_card(&self, card_number: &str) -> AppResult<Option<ValetSession>> {
        debug!("Finding parked session for card: {}", card_number);

        let result = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions \
             WHERE client_card_number = $1 AND status = 'parked' \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(card_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding parked session by card: {}", e);
            AppError::Database(format!("Failed to find parked session: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        search: Option<&str>,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ValetSession>, i64)> {
        debug!("Listing sessions, search={:?} status={:?}", search, status);

        let pattern = search.map(|s| format!("%{}%", s.trim()));
        let status_str = status.map(|s| s.to_string());

        let filter = r#"
            WHERE ($1::text IS NULL OR
                   car_number ILIKE $1 OR
                   client_name ILIKE $1 OR
                   client_card_number ILIKE $1 OR
                   session_number ILIKE $1)
              AND ($2::text IS NULL OR status = $2)
        "#;

        let rows = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions {filter} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(&pattern)
        .bind(&status_str)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing sessions: {}", e);
            AppError::Database(format!("Failed to list sessions: {}", e))
        })?;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM valet_sessions {filter}"
        ))
        .bind(&pattern)
        .bind(&status_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting filtered sessions: {}", e);
            AppError::Database(format!("Failed to count sessions: {}", e))
        })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn list_active(&self, limit: i64) -> AppResult<Vec<ValetSession>> {
        debug!("Listing active sessions");

        let rows = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions \
             WHERE status NOT IN ('completed', 'cancelled') \
             ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing active sessions: {}", e);
            AppError::Database(format!("Failed to list active sessions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_employee(
        &self,
        employee_id: i32,
        status: Option<SessionStatus>,
    ) -> AppResult<Vec<ValetSession>> {
        debug!("Listing sessions for employee: {}", employee_id);

        let status_str = status.map(|s| s.to_string());

        let rows = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions \
             WHERE (employee_id = $1 OR request_accepted_by_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(employee_id)
        .bind(&status_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing sessions by employee: {}", e);
            AppError::Database(format!("Failed to list sessions by employee: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, patch))]
    async fn apply_patch(&self, id: i32, patch: &SessionPatch) -> AppResult<ValetSession> {
        debug!("Patching session: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            r#"
            UPDATE valet_sessions
            SET employee_id = COALESCE($2, employee_id),
                request_accepted_by_id = COALESCE($3, request_accepted_by_id),
                car_model = COALESCE($4, car_model),
                car_color = COALESCE($5, car_color),
                client_name = COALESCE($6, client_name),
                client_phone = COALESCE($7, client_phone),
                client_card_number = COALESCE($8, client_card_number),
                parking_spot = COALESCE($9, parking_spot),
                parking_card = COALESCE($10, parking_card),
                has_subscription = COALESCE($11, has_subscription),
                notes = COALESCE($12, notes),
                status = COALESCE($13, status),
                car_photos_urls = COALESCE($14, car_photos_urls),
                parking_photos_urls = COALESCE($15, parking_photos_urls),
                return_start_photos_urls = COALESCE($16, return_start_photos_urls),
                return_delivery_photos_urls = COALESCE($17, return_delivery_photos_urls),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.employee_id)
        .bind(patch.request_accepted_by_id)
        .bind(&patch.car_model)
        .bind(&patch.car_color)
        .bind(&patch.client_name)
        .bind(&patch.client_phone)
        .bind(&patch.client_card_number)
        .bind(&patch.parking_spot)
        .bind(&patch.parking_card)
        .bind(patch.has_subscription)
        .bind(&patch.notes)
        .bind(patch.status.map(|s| s.to_string()))
        .bind(&patch.car_photos_urls)
        .bind(&patch.parking_photos_urls)
        .bind(&patch.return_start_photos_urls)
        .bind(&patch.return_delivery_photos_urls)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::SessionNotFound(id.to_string()),
            _ => {
                error!("Database error patching session {}: {}", id, e);
                AppError::Database(format!("Failed to patch session: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, cost))]
    async fn save_cost(&self, id: i32, cost: &CostUpdate) -> AppResult<ValetSession> {
        debug!("Saving cost for session: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            r#"
            UPDATE valet_sessions
            SET calculated_cost = $2,
                cost_calculation_details = $3,
                cost_calculated_at = $4,
                is_cost_final = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(cost.calculated_cost)
        .bind(&cost.cost_calculation_details)
        .bind(cost.cost_calculated_at)
        .bind(cost.is_cost_final)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::SessionNotFound(id.to_string()),
            _ => {
                error!("Database error saving cost for session {}: {}", id, e);
                AppError::Database(format!("Failed to save cost: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn add_payment(
        &self,
        id: i32,
        amount: Option<Decimal>,
        payment_method: &str,
        payment_reference: Option<&str>,
    ) -> AppResult<PaymentOutcome> {
        debug!("Recording payment for session: {}", id);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Transaction(format!("Failed to begin transaction: {}", e)))?;

        // Row lock: two concurrent payments must not both read the same
        // running total.
        let locked: ValetSession = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM valet_sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error locking session {}: {}", id, e);
            AppError::Database(format!("Failed to lock session for payment: {}", e))
        })?
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?
        .into();

        let cost = locked.calculated_cost.ok_or(AppError::NoCostToPay)?;
        let remaining = (cost - locked.paid_amount).max(Decimal::ZERO);
        let amount = amount.unwrap_or(remaining);

        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }
        if amount > remaining {
            return Err(AppError::OverpaymentAttempt {
                remaining: remaining.to_string(),
            });
        }

        let total_paid = locked.paid_amount + amount;
        let payment_status = PaymentStatus::derive(total_paid, cost);

        let row = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            r#"
            UPDATE valet_sessions
            SET paid_amount = $2,
                payment_status = $3,
                payment_method = $4,
                payment_date = NOW(),
                payment_reference = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(total_paid)
        .bind(payment_status.to_string())
        .bind(payment_method)
        .bind(payment_reference)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error saving payment for session {}: {}", id, e);
            AppError::Database(format!("Failed to save payment: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(PaymentOutcome {
            session: row.into(),
            amount_received: amount,
        })
    }

    #[instrument(skip(self))]
    async fn set_tariff(&self, id: i32, tariff_id: i32) -> AppResult<ValetSession> {
        debug!("Setting tariff {} on session {}", tariff_id, id);

        let row = sqlx::query_as::<sqlx::Postgres, SessionRow>(&format!(
            "UPDATE valet_sessions SET tariff_id = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(tariff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::SessionNotFound(id.to_string()),
            _ => {
                error!("Database error setting tariff on session {}: {}", id, e);
                AppError::Database(format!("Failed to set session tariff: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn reset_costs_for_tariff(&self, tariff_id: i32) -> AppResult<i64> {
        debug!("Resetting cached costs for tariff: {}", tariff_id);

        let result = sqlx::query(
            r#"
            UPDATE valet_sessions
            SET calculated_cost = NULL,
                cost_calculation_details = NULL,
                cost_calculated_at = NULL,
                updated_at = NOW()
            WHERE tariff_id = $1
              AND is_cost_final = FALSE
              AND status NOT IN ('completed', 'cancelled')
              AND calculated_cost IS NOT NULL
            "#,
        )
        .bind(tariff_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error resetting cached costs: {}", e);
            AppError::Database(format!("Failed to reset cached costs: {}", e))
        })?;

        let reset_count = result.rows_affected() as i64;

        if reset_count > 0 {
            warn!(
                "Invalidated cached cost on {} sessions for tariff {}",
                reset_count, tariff_id
            );
        }

        Ok(reset_count)
    }

    #[instrument(skip(self))]
    async fn session_number_exists(&self, session_number: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM valet_sessions WHERE session_number = $1)",
        )
        .bind(session_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking session number: {}", e);
            AppError::Database(format!("Failed to check session number: {}", e))
        })?;

        Ok(result.0)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i32,
    employee_id: Option<i32>,
    request_accepted_by_id: Option<i32>,
    car_number: String,
    car_model: Option<String>,
    car_color: Option<String>,
    client_name: Option<String>,
    client_phone: Option<String>,
    client_card_number: Option<String>,
    parking_spot: Option<String>,
    parking_card: Option<String>,
    has_subscription: bool,
    notes: Option<String>,
    status: String,
    session_number: Option<String>,
    tariff_id: Option<i32>,
    car_photos_urls: Option<String>,
    parking_photos_urls: Option<String>,
    return_start_photos_urls: Option<String>,
    return_delivery_photos_urls: Option<String>,
    calculated_cost: Option<Decimal>,
    cost_calculation_details: Option<JsonValue>,
    cost_calculated_at: Option<DateTime<Utc>>,
    is_cost_final: bool,
    payment_status: String,
    payment_method: Option<String>,
    paid_amount: Decimal,
    payment_date: Option<DateTime<Utc>>,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for ValetSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            employee_id: row.employee_id,
            request_accepted_by_id: row.request_accepted_by_id,
            car_number: row.car_number,
            car_model: row.car_model,
            car_color: row.car_color,
            client_name: row.client_name,
            client_phone: row.client_phone,
            client_card_number: row.client_card_number,
            parking_spot: row.parking_spot,
            parking_card: row.parking_card,
            has_subscription: row.has_subscription,
            notes: row.notes,
            status: PgSessionRepository::parse_status(&row.status),
            session_number: row.session_number,
            tariff_id: row.tariff_id,
            car_photos_urls: row.car_photos_urls,
            parking_photos_urls: row.parking_photos_urls,
            return_start_photos_urls: row.return_start_photos_urls,
            return_delivery_photos_urls: row.return_delivery_photos_urls,
            calculated_cost: row.calculated_cost,
            cost_calculation_details: row.cost_calculation_details,
            cost_calculated_at: row.cost_calculated_at,
            is_cost_final: row.is_cost_final,
            payment_status: PgSessionRepository::parse_payment_status(&row.payment_status),
            payment_method: row.payment_method,
            paid_amount: row.paid_amount,
            payment_date: row.payment_date,
            payment_reference: row.payment_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            PgSessionRepository::parse_status("parked"),
            SessionStatus::Parked
        );
        assert_eq!(
            PgSessionRepository::parse_status("return_requested"),
            SessionStatus::ReturnRequested
        );
        // Unknown statuses fall back to created
        assert_eq!(
            PgSessionRepository::parse_status("towed"),
            SessionStatus::Created
        );
    }

    #[test]
    fn test_parse_payment_status() {
        assert_eq!(
            PgSessionRepository::parse_payment_status("paid"),
            PaymentStatus::Paid
        );
        assert_eq!(
            PgSessionRepository::parse_payment_status("unknown"),
            PaymentStatus::Pending
        );
    }
}
