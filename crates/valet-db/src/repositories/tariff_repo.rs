//! Parking tariff repository implementation
//!
//! Provides PostgreSQL-backed storage for parking tariffs. Writes that set a
//! default flag clear the same flag on every other active tariff inside one
//! transaction, so each audience has at most one default at any time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, instrument};
use valet_core::{
    models::{Tariff, TariffType},
    traits::{DefaultAudience, Repository, TariffRepository},
    AppError, AppResult,
};

const TARIFF_COLUMNS: &str = r#"
    id, name, description, tariff_type,
    price_per_hour, price_per_day,
    minimum_hours, maximum_hours, free_minutes,
    is_active, is_default_for_residents, is_default_for_guests,
    created_at, updated_at
"#;

/// PostgreSQL implementation of TariffRepository
pub struct PgTariffRepository {
    pool: PgPool,
}

impl PgTariffRepository {
    /// Create a new tariff repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse tariff type from string, falling back to hourly
    fn parse_type(s: &str) -> TariffType {
        TariffType::from_str(s).unwrap_or(TariffType::Hourly)
    }

    fn flag_column(audience: DefaultAudience) -> &'static str {
        match audience {
            DefaultAudience::Residents => "is_default_for_residents",
            DefaultAudience::Guests => "is_default_for_guests",
        }
    }

    /// Clear a default flag on every tariff except the given one
    async fn clear_other_defaults(
        tx: &mut Transaction<'_, Postgres>,
        audience: DefaultAudience,
        keep_id: i32,
    ) -> AppResult<()> {
        let column = Self::flag_column(audience);
        let sql = format!(
            "UPDATE parking_tariffs SET {column} = FALSE, updated_at = NOW() \
             WHERE {column} = TRUE AND id <> $1"
        );

        sqlx::query(&sql)
            .bind(keep_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                error!("Database error clearing default flags: {}", e);
                AppError::Database(format!("Failed to clear default flags: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait]
impl Repository<Tariff, i32> for PgTariffRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Tariff>> {
        debug!("Finding tariff by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            "SELECT {TARIFF_COLUMNS} FROM parking_tariffs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding tariff {}: {}", id, e);
            AppError::Database(format!("Failed to find tariff: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        debug!("Finding all tariffs with limit {} offset {}", limit, offset);

        let rows = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            "SELECT {TARIFF_COLUMNS} FROM parking_tariffs \
             ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding tariffs: {}", e);
            AppError::Database(format!("Failed to fetch tariffs: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM parking_tariffs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting tariffs: {}", e);
                AppError::Database(format!("Failed to count tariffs: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Tariff) -> AppResult<Tariff> {
        debug!("Creating tariff: {}", entity.name);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        let row = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            r#"
            INSERT INTO parking_tariffs (
                name, description, tariff_type,
                price_per_hour, price_per_day,
                minimum_hours, maximum_hours, free_minutes,
                is_active, is_default_for_residents, is_default_for_guests
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {TARIFF_COLUMNS}
            "#
        ))
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(entity.tariff_type.to_string())
        .bind(entity.price_per_hour)
        .bind(entity.price_per_day)
        .bind(entity.minimum_hours)
        .bind(entity.maximum_hours)
        .bind(entity.free_minutes)
        .bind(entity.is_active)
        .bind(entity.is_default_for_residents)
        .bind(entity.is_default_for_guests)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error creating tariff: {}", e);
            AppError::Database(format!("Failed to create tariff: {}", e))
        })?;

        if entity.is_default_for_residents {
            Self::clear_other_defaults(&mut tx, DefaultAudience::Residents, row.id).await?;
        }
        if entity.is_default_for_guests {
            Self::clear_other_defaults(&mut tx, DefaultAudience::Guests, row.id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Tariff) -> AppResult<Tariff> {
        debug!("Updating tariff: {}", entity.id);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        let row = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            r#"
            UPDATE parking_tariffs
            SET name = $2,
                description = $3,
                tariff_type = $4,
                price_per_hour = $5,
                price_per_day = $6,
                minimum_hours = $7,
                maximum_hours = $8,
                free_minutes = $9,
                is_active = $10,
                is_default_for_residents = $11,
                is_default_for_guests = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TARIFF_COLUMNS}
            "#
        ))
        .bind(entity.id)
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(entity.tariff_type.to_string())
        .bind(entity.price_per_hour)
        .bind(entity.price_per_day)
        .bind(entity.minimum_hours)
        .bind(entity.maximum_hours)
        .bind(entity.free_minutes)
        .bind(entity.is_active)
        .bind(entity.is_default_for_residents)
        .bind(entity.is_default_for_guests)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::TariffNotFound(entity.id.to_string()),
            _ => {
                error!("Database error updating tariff {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update tariff: {}", e))
            }
        })?;

        if entity.is_default_for_residents {
            Self::clear_other_defaults(&mut tx, DefaultAudience::Residents, row.id).await?;
        }
        if entity.is_default_for_guests {
            Self::clear_other_defaults(&mut tx, DefaultAudience::Guests, row.id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting tariff: {}", id);

        let result = sqlx::query("DELETE FROM parking_tariffs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting tariff {}: {}", id, e);
                AppError::Database(format!("Failed to delete tariff: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TariffRepository for PgTariffRepository {
    #[instrument(skip(self))]
    async fn find_active(&self, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        debug!("Finding active tariffs");

        let rows = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            "SELECT {TARIFF_COLUMNS} FROM parking_tariffs \
             WHERE is_active = TRUE ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding active tariffs: {}", e);
            AppError::Database(format!("Failed to fetch active tariffs: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_type(&self, tariff_type: &str) -> AppResult<Vec<Tariff>> {
        debug!("Finding active tariffs of type: {}", tariff_type);

        let rows = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            "SELECT {TARIFF_COLUMNS} FROM parking_tariffs \
             WHERE is_active = TRUE AND tariff_type = $1 ORDER BY id"
        ))
        .bind(tariff_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding tariffs by type: {}", e);
            AppError::Database(format!("Failed to fetch tariffs by type: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_default(&self, audience: DefaultAudience) -> AppResult<Option<Tariff>> {
        debug!("Finding default tariff for {:?}", audience);

        let column = Self::flag_column(audience);
        let result = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            "SELECT {TARIFF_COLUMNS} FROM parking_tariffs \
             WHERE is_active = TRUE AND {column} = TRUE \
             ORDER BY updated_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding default tariff: {}", e);
            AppError::Database(format!("Failed to find default tariff: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn set_default(&self, id: i32, audience: DefaultAudience) -> AppResult<Tariff> {
        debug!("Setting tariff {} as default for {:?}", id, audience);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        Self::clear_other_defaults(&mut tx, audience, id).await?;

        let column = Self::flag_column(audience);
        let row = sqlx::query_as::<sqlx::Postgres, TariffRow>(&format!(
            "UPDATE parking_tariffs SET {column} = TRUE, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {TARIFF_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::TariffNotFound(id.to_string()),
            _ => {
                error!("Database error setting default tariff {}: {}", id, e);
                AppError::Database(format!("Failed to set default tariff: {}", e))
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(row.into())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct TariffRow {
    id: i32,
    name: String,
    description: Option<String>,
    tariff_type: String,
    price_per_hour: Decimal,
    price_per_day: Decimal,
    minimum_hours: i32,
    maximum_hours: Option<i32>,
    free_minutes: i32,
    is_active: bool,
    is_default_for_residents: bool,
    is_default_for_guests: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TariffRow> for Tariff {
    fn from(row: TariffRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            tariff_type: PgTariffRepository::parse_type(&row.tariff_type),
            price_per_hour: row.price_per_hour,
            price_per_day: row.price_per_day,
            minimum_hours: row.minimum_hours,
            maximum_hours: row.maximum_hours,
            free_minutes: row.free_minutes,
            is_active: row.is_active,
            is_default_for_residents: row.is_default_for_residents,
            is_default_for_guests: row.is_default_for_guests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        assert_eq!(PgTariffRepository::parse_type("daily"), TariffType::Daily);
        assert_eq!(PgTariffRepository::parse_type("vip"), TariffType::Vip);
        // Unknown types fall back to hourly
        assert_eq!(PgTariffRepository::parse_type("weekly"), TariffType::Hourly);
    }

    #[test]
    fn test_flag_column() {
        assert_eq!(
            PgTariffRepository::flag_column(DefaultAudience::Residents),
            "is_default_for_residents"
        );
        assert_eq!(
            PgTariffRepository::flag_column(DefaultAudience::Guests),
            "is_default_for_guests"
        );
    }
}
