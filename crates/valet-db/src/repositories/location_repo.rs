//! Location repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use valet_core::{
    models::{Location, ParkingLot},
    traits::{LocationRepository, Repository},
    AppError, AppResult,
};

const LOCATION_COLUMNS: &str =
    "id, name, address, latitude, longitude, description, is_active, created_at, updated_at";

const LOT_COLUMNS: &str = "id, location_id, name, address, lot_type, floor_count, total_spaces, \
                           created_at, updated_at";

/// PostgreSQL implementation of LocationRepository
pub struct PgLocationRepository {
    pool: PgPool,
}

impl PgLocationRepository {
    /// Create a new location repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Location, i32> for PgLocationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Location>> {
        debug!("Finding location by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding location {}: {}", id, e);
            AppError::Database(format!("Failed to find location: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<sqlx::Postgres, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations ORDER BY name LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding locations: {}", e);
            AppError::Database(format!("Failed to fetch locations: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM locations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting locations: {}", e);
                AppError::Database(format!("Failed to count locations: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Location) -> AppResult<Location> {
        debug!("Creating location: {}", entity.name);

        let row = sqlx::query_as::<sqlx::Postgres, LocationRow>(&format!(
            r#"
            INSERT INTO locations (name, address, latitude, longitude, description, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&entity.name)
        .bind(&entity.address)
        .bind(entity.latitude)
        .bind(entity.longitude)
        .bind(&entity.description)
        .bind(entity.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating location: {}", e);
            AppError::Database(format!("Failed to create location: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Location) -> AppResult<Location> {
        debug!("Updating location: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, LocationRow>(&format!(
            r#"
            UPDATE locations
            SET name = $2,
                address = $3,
                latitude = $4,
                longitude = $5,
                description = $6,
                is_active = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(entity.id)
        .bind(&entity.name)
        .bind(&entity.address)
        .bind(entity.latitude)
        .bind(entity.longitude)
        .bind(&entity.description)
        .bind(entity.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Location {}", entity.id)),
            _ => {
                error!("Database error updating location {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update location: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting location: {}", id);

        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting location {}: {}", id, e);
                AppError::Database(format!("Failed to delete location: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    #[instrument(skip(self))]
    async fn find_lots(&self, location_id: i32) -> AppResult<Vec<ParkingLot>> {
        debug!("Finding parking lots for location: {}", location_id);

        let rows = sqlx::query_as::<sqlx::Postgres, ParkingLotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM parking_lots WHERE location_id = $1 ORDER BY name"
        ))
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error finding lots for location {}: {}",
                location_id, e
            );
            AppError::Database(format!("Failed to fetch parking lots: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: i32,
    name: String,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ParkingLotRow {
    id: i32,
    location_id: Option<i32>,
    name: String,
    address: String,
    lot_type: Option<String>,
    floor_count: Option<i32>,
    total_spaces: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ParkingLotRow> for ParkingLot {
    fn from(row: ParkingLotRow) -> Self {
        Self {
            id: row.id,
            location_id: row.location_id,
            name: row.name,
            address: row.address,
            lot_type: row.lot_type,
            floor_count: row.floor_count,
            total_spaces: row.total_spaces,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
