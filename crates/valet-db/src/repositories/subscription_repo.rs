//! Subscription repository implementation
//!
//! Subscriptions are keyed by the client card number; the active-by-card
//! lookup backs the resident check when a session is opened for a card.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use valet_core::{
    models::{Subscription, SubscriptionPlan, SubscriptionStatus},
    traits::{Repository, SubscriptionRepository},
    AppError, AppResult,
};

const SUBSCRIPTION_COLUMNS: &str =
    "id, plan_id, location_id, client_name, client_phone, client_card_number, car_number, \
     car_model, start_date, end_date, visits_used, status, created_at, updated_at";

const PLAN_COLUMNS: &str =
    "id, location_id, name, description, price_per_month, min_duration_months, \
     max_duration_months, is_active, created_at, updated_at";

/// Parse a stored status code
///
/// Unknown codes read as expired so a corrupt row never grants resident
/// terms.
fn parse_status(code: &str) -> SubscriptionStatus {
    SubscriptionStatus::from_str(code).unwrap_or(SubscriptionStatus::Expired)
}

/// PostgreSQL implementation of SubscriptionRepository
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Subscription, i32> for PgSubscriptionRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Subscription>> {
        debug!("Finding subscription by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding subscription {}: {}", id, e);
            AppError::Database(format!("Failed to find subscription: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding subscriptions: {}", e);
            AppError::Database(format!("Failed to fetch subscriptions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting subscriptions: {}", e);
                AppError::Database(format!("Failed to count subscriptions: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Subscription) -> AppResult<Subscription> {
        debug!("Creating subscription for card {}", entity.client_card_number);

        let row = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            INSERT INTO subscriptions
                (plan_id, location_id, client_name, client_phone, client_card_number,
                 car_number, car_model, start_date, end_date, visits_used, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(entity.plan_id)
        .bind(entity.location_id)
        .bind(&entity.client_name)
        .bind(&entity.client_phone)
        .bind(&entity.client_card_number)
        .bind(&entity.car_number)
        .bind(&entity.car_model)
        .bind(entity.start_date)
        .bind(entity.end_date)
        .bind(entity.visits_used)
        .bind(entity.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating subscription: {}", e);
            AppError::Database(format!("Failed to create subscription: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Subscription) -> AppResult<Subscription> {
        debug!("Updating subscription: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET plan_id = $2,
                location_id = $3,
                client_name = $4,
                client_phone = $5,
                client_card_number = $6,
                car_number = $7,
                car_model = $8,
                start_date = $9,
                end_date = $10,
                visits_used = $11,
                status = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(entity.id)
        .bind(entity.plan_id)
        .bind(entity.location_id)
        .bind(&entity.client_name)
        .bind(&entity.client_phone)
        .bind(&entity.client_card_number)
        .bind(&entity.car_number)
        .bind(&entity.car_model)
        .bind(entity.start_date)
        .bind(entity.end_date)
        .bind(entity.visits_used)
        .bind(entity.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Subscription {}", entity.id)),
            _ => {
                error!("Database error updating subscription {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update subscription: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting subscription: {}", id);

        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting subscription {}: {}", id, e);
                AppError::Database(format!("Failed to delete subscription: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    #[instrument(skip(self))]
    async fn find_active_by_card(&self, card_number: &str) -> AppResult<Option<Subscription>> {
        debug!("Finding active subscription by card");

        let result = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
            WHERE client_card_number = $1
              AND status = 'active'
              AND (start_date IS NULL OR start_date <= CURRENT_DATE)
              AND (end_date IS NULL OR end_date >= CURRENT_DATE)
            ORDER BY end_date DESC NULLS FIRST
            LIMIT 1
            "#
        ))
        .bind(card_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding subscription by card: {}", e);
            AppError::Database(format!("Failed to find subscription by card: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_plans(&self, limit: i64, offset: i64) -> AppResult<Vec<SubscriptionPlan>> {
        let rows = sqlx::query_as::<sqlx::Postgres, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans \
             WHERE is_active = TRUE ORDER BY name LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding subscription plans: {}", e);
            AppError::Database(format!("Failed to fetch subscription plans: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i32,
    plan_id: Option<i32>,
    location_id: Option<i32>,
    client_name: Option<String>,
    client_phone: Option<String>,
    client_card_number: String,
    car_number: Option<String>,
    car_model: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    visits_used: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            plan_id: row.plan_id,
            location_id: row.location_id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            client_card_number: row.client_card_number,
            car_number: row.car_number,
            car_model: row.car_model,
            start_date: row.start_date,
            end_date: row.end_date,
            visits_used: row.visits_used,
            status: parse_status(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: i32,
    location_id: Option<i32>,
    name: String,
    description: Option<String>,
    price_per_month: Decimal,
    min_duration_months: Option<i32>,
    max_duration_months: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: row.id,
            location_id: row.location_id,
            name: row.name,
            description: row.description,
            price_per_month: row.price_per_month,
            min_duration_months: row.min_duration_months,
            max_duration_months: row.max_duration_months,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_fallback() {
        assert_eq!(parse_status("active"), SubscriptionStatus::Active);
        assert_eq!(parse_status("cancelled"), SubscriptionStatus::Cancelled);
        // Corrupt codes must never grant resident terms
        assert_eq!(parse_status("bogus"), SubscriptionStatus::Expired);
    }
}
