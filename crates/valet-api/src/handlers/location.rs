//! Location handlers
//!
//! Read-only location and parking-lot endpoints; sites are administered in
//! the back office.

use crate::dto::location::{LocationResponse, ParkingLotResponse};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::{instrument, warn};
use valet_core::traits::{LocationRepository, Repository};
use valet_core::AppError;
use valet_db::PgLocationRepository;
use validator::Validate;

/// List locations
///
/// GET /api/v1/locations
#[instrument(skip(pool))]
pub async fn list_locations(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let repo = PgLocationRepository::new(pool.get_ref().clone());
    let locations = repo.find_all(query.limit(), query.offset()).await?;
    let total = repo.count().await?;

    let data: Vec<LocationResponse> = locations.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(query.paginate(data, total)))
}

/// Get a single location
///
/// GET /api/v1/locations/{id}
#[instrument(skip(pool))]
pub async fn get_location(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let location_id = path.into_inner();

    let repo = PgLocationRepository::new(pool.get_ref().clone());
    let location = repo
        .find_by_id(location_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {}", location_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(LocationResponse::from(location))))
}

/// Parking lots of a location
///
/// GET /api/v1/locations/{id}/lots
#[instrument(skip(pool))]
pub async fn get_location_lots(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let location_id = path.into_inner();

    let repo = PgLocationRepository::new(pool.get_ref().clone());
    if repo.find_by_id(location_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Location {}", location_id)));
    }

    let lots = repo.find_lots(location_id).await?;
    let data: Vec<ParkingLotResponse> = lots.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Configure location routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/locations")
            .route("", web::get().to(list_locations))
            .route("/{id}", web::get().to(get_location))
            .route("/{id}/lots", web::get().to(get_location_lots)),
    );
}
