//! Employee handlers
//!
//! Read-only employee endpoints; accounts and roles live in a separate
//! system.

use crate::dto::employee::EmployeeResponse;
use crate::dto::session::{SessionFilterParams, SessionResponse};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{instrument, warn};
use valet_core::config::ValetConfig;
use valet_core::traits::Repository;
use valet_core::AppError;
use valet_db::{
    PgEmployeeRepository, PgSessionLogRepository, PgSessionRepository, PgTariffRepository,
};
use valet_services::SessionManager;
use validator::Validate;

/// List employees
///
/// GET /api/v1/employees
#[instrument(skip(pool))]
pub async fn list_employees(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let repo = PgEmployeeRepository::new(pool.get_ref().clone());
    let employees = repo.find_all(query.limit(), query.offset()).await?;
    let total = repo.count().await?;

    let data: Vec<EmployeeResponse> = employees.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(query.paginate(data, total)))
}

/// Get a single employee
///
/// GET /api/v1/employees/{id}
#[instrument(skip(pool))]
pub async fn get_employee(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    let repo = PgEmployeeRepository::new(pool.get_ref().clone());
    let employee = repo
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| AppError::EmployeeNotFound(employee_id.to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(EmployeeResponse::from(employee))))
}

/// Sessions an employee drove or accepted the return for
///
/// GET /api/v1/employees/{id}/sessions
#[instrument(skip(pool, config))]
pub async fn get_employee_sessions(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
    filters: web::Query<SessionFilterParams>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    let status = filters.parsed_status()?;

    let repo = PgEmployeeRepository::new(pool.get_ref().clone());
    if repo.find_by_id(employee_id).await?.is_none() {
        return Err(AppError::EmployeeNotFound(employee_id.to_string()));
    }

    let mgr = SessionManager::new(
        Arc::new(PgSessionRepository::new(pool.get_ref().clone())),
        Arc::new(PgTariffRepository::new(pool.get_ref().clone())),
        Arc::new(PgSessionLogRepository::new(pool.get_ref().clone())),
        config.get_ref().clone(),
    );
    let sessions = mgr.list_by_employee(employee_id, status).await?;

    let data: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Configure employee routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            .route("", web::get().to(list_employees))
            .route("/{id}", web::get().to(get_employee))
            .route("/{id}/sessions", web::get().to(get_employee_sessions)),
    );
}
