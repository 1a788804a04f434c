//! Parking tariff handlers
//!
//! HTTP handlers for tariff administration and stateless cost quotes.

use crate::dto::tariff::{
    AutoTariffParams, CalculationRequest, CalculationResponse, TariffCreateRequest,
    TariffFilterParams, TariffResponse, TariffUpdateRequest,
};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use valet_core::config::ValetConfig;
use valet_core::AppError;
use valet_db::{PgSessionRepository, PgTariffRepository};
use valet_services::TariffService;
use validator::Validate;

type PgTariffService = TariffService<PgTariffRepository, PgSessionRepository>;

fn service(pool: &PgPool, config: &ValetConfig) -> PgTariffService {
    TariffService::new(
        Arc::new(PgTariffRepository::new(pool.clone())),
        Arc::new(PgSessionRepository::new(pool.clone())),
        config.clone(),
    )
}

/// List tariffs
///
/// GET /api/v1/tariffs
#[instrument(skip(pool, config))]
pub async fn list_tariffs(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    query: web::Query<PaginationParams>,
    filters: web::Query<TariffFilterParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(active_only = filters.active_only, "Listing tariffs");

    let svc = service(pool.get_ref(), config.get_ref());
    let tariffs = svc
        .list(filters.active_only, query.limit(), query.offset())
        .await?;

    let data: Vec<TariffResponse> = tariffs.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Create a tariff
///
/// POST /api/v1/tariffs
#[instrument(skip(pool, config, req))]
pub async fn create_tariff(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    req: web::Json<TariffCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Tariff creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let svc = service(pool.get_ref(), config.get_ref());
    let created = svc.create(req.to_tariff()).await?;

    info!(id = created.id, name = %created.name, "Tariff created");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        TariffResponse::from(created),
        "Tariff created",
    )))
}

/// The tariff a new session would be assigned
///
/// GET /api/v1/tariffs/auto
#[instrument(skip(pool, config))]
pub async fn get_auto_tariff(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    params: web::Query<AutoTariffParams>,
) -> Result<HttpResponse, AppError> {
    let svc = service(pool.get_ref(), config.get_ref());
    let tariff = svc.get_auto(params.has_subscription).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TariffResponse::from(tariff))))
}

/// Stateless cost quote for a hypothetical stay
///
/// POST /api/v1/tariffs/calculate
#[instrument(skip(pool, config, req))]
pub async fn calculate_cost(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    req: web::Json<CalculationRequest>,
) -> Result<HttpResponse, AppError> {
    let svc = service(pool.get_ref(), config.get_ref());
    let calc = svc
        .calculate(req.tariff_id, req.duration_hours, req.has_subscription)
        .await?;

    let response = CalculationResponse::from_calculation(req.tariff_id, &calc);
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Active tariffs of one pricing type
///
/// GET /api/v1/tariffs/type/{tariff_type}
#[instrument(skip(pool, config))]
pub async fn list_tariffs_by_type(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let tariff_type = path.into_inner();
    let svc = service(pool.get_ref(), config.get_ref());
    let tariffs = svc.list_by_type(&tariff_type).await?;

    let data: Vec<TariffResponse> = tariffs.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Get a single tariff
///
/// GET /api/v1/tariffs/{id}
#[instrument(skip(pool, config))]
pub async fn get_tariff(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let svc = service(pool.get_ref(), config.get_ref());
    let tariff = svc.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TariffResponse::from(tariff))))
}

/// Update a tariff
///
/// PUT /api/v1/tariffs/{id}
#[instrument(skip(pool, config, req))]
pub async fn update_tariff(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
    req: web::Json<TariffUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Tariff update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let svc = service(pool.get_ref(), config.get_ref());
    let updated = svc.update(path.into_inner(), req.to_update()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        TariffResponse::from(updated),
        "Tariff updated",
    )))
}

/// Deactivate a tariff
///
/// DELETE /api/v1/tariffs/{id}
///
/// Tariffs referenced by past sessions are never hard-deleted.
#[instrument(skip(pool, config))]
pub async fn delete_tariff(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let tariff_id = path.into_inner();
    let svc = service(pool.get_ref(), config.get_ref());
    svc.deactivate(tariff_id).await?;

    info!(id = tariff_id, "Tariff deactivated");

    Ok(HttpResponse::NoContent().finish())
}

/// Make a tariff the resident default
///
/// POST /api/v1/tariffs/{id}/set-default-residents
#[instrument(skip(pool, config))]
pub async fn set_default_for_residents(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let svc = service(pool.get_ref(), config.get_ref());
    let tariff = svc.set_default_for_residents(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        TariffResponse::from(tariff),
        "Resident default updated",
    )))
}

/// Make a tariff the guest default
///
/// POST /api/v1/tariffs/{id}/set-default-guests
#[instrument(skip(pool, config))]
pub async fn set_default_for_guests(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let svc = service(pool.get_ref(), config.get_ref());
    let tariff = svc.set_default_for_guests(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        TariffResponse::from(tariff),
        "Guest default updated",
    )))
}

/// Configure tariff routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tariffs")
            .route("", web::get().to(list_tariffs))
            .route("", web::post().to(create_tariff))
            .route("/auto", web::get().to(get_auto_tariff))
            .route("/calculate", web::post().to(calculate_cost))
            .route("/type/{tariff_type}", web::get().to(list_tariffs_by_type))
            .route("/{id}", web::get().to(get_tariff))
            .route("/{id}", web::put().to(update_tariff))
            .route("/{id}", web::delete().to(delete_tariff))
            .route(
                "/{id}/set-default-residents",
                web::post().to(set_default_for_residents),
            )
            .route(
                "/{id}/set-default-guests",
                web::post().to(set_default_for_guests),
            ),
    );
}
