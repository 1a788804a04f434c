//! Valet session handlers
//!
//! HTTP handlers for the session lifecycle, cost queries, payments and the
//! audit log.

use crate::dto::session::{
    CardCheckResponse, PaymentRequest, SessionCreateRequest, SessionFilterParams, SessionResponse,
    SessionTariffRequest, SessionUpdateRequest,
};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use valet_core::config::ValetConfig;
use valet_core::AppError;
use valet_db::{PgSessionLogRepository, PgSessionRepository, PgTariffRepository};
use valet_services::SessionManager;
use std::sync::Arc;
use validator::Validate;

type PgSessionManager =
    SessionManager<PgSessionRepository, PgTariffRepository, PgSessionLogRepository>;

fn manager(pool: &PgPool, config: &ValetConfig) -> PgSessionManager {
    SessionManager::new(
        Arc::new(PgSessionRepository::new(pool.clone())),
        Arc::new(PgTariffRepository::new(pool.clone())),
        Arc::new(PgSessionLogRepository::new(pool.clone())),
        config.clone(),
    )
}

/// List sessions with search and status filters
///
/// GET /api/v1/sessions
#[instrument(skip(pool, config))]
pub async fn list_sessions(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    query: web::Query<PaginationParams>,
    filters: web::Query<SessionFilterParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let status = filters.parsed_status()?;

    debug!(
        page = query.page,
        per_page = query.per_page,
        search = ?filters.search,
        status = ?status,
        "Listing sessions"
    );

    let mgr = manager(pool.get_ref(), config.get_ref());
    let (sessions, total) = mgr
        .list_sessions(
            filters.search.as_deref(),
            status,
            query.limit(),
            query.offset(),
        )
        .await?;

    let data: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(query.paginate(data, total)))
}

/// Create a valet session
///
/// POST /api/v1/sessions
#[instrument(skip(pool, config, req))]
pub async fn create_session(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    req: web::Json<SessionCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Session creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let mgr = manager(pool.get_ref(), config.get_ref());
    let created = mgr.create_session(req.to_input()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        SessionResponse::from(created),
        "Valet session created",
    )))
}

/// All sessions still in progress
///
/// GET /api/v1/sessions/active
#[instrument(skip(pool, config))]
pub async fn list_active_sessions(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    let sessions = mgr.list_active(query.limit()).await?;

    let data: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Whether a client card is free to start a session
///
/// GET /api/v1/sessions/check-card/{card_number}
#[instrument(skip(pool, config))]
pub async fn check_card(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let card_number = path.into_inner();
    let mgr = manager(pool.get_ref(), config.get_ref());
    let available = mgr.check_card(&card_number).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(CardCheckResponse {
        card_number,
        available,
    })))
}

/// The active session for a client card
///
/// GET /api/v1/sessions/by-card/{card_number}
#[instrument(skip(pool, config))]
pub async fn get_session_by_card(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let card_number = path.into_inner();
    let mgr = manager(pool.get_ref(), config.get_ref());

    let session = mgr
        .find_by_card(&card_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No active session for card {}", card_number)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(session))))
}

/// Request the car back for a client card
///
/// POST /api/v1/sessions/request-return/{card_number}
///
/// Returns 200 with either a granted outcome or a payment-required outcome;
/// owing money is not an error.
#[instrument(skip(pool, config))]
pub async fn request_return(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let card_number = path.into_inner();
    let mgr = manager(pool.get_ref(), config.get_ref());
    let outcome = mgr.request_return(&card_number).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

/// Get a single session
///
/// GET /api/v1/sessions/{id}
#[instrument(skip(pool, config))]
pub async fn get_session(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    let session = mgr.get_session(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(session))))
}

/// Update a session (fields and/or status transition)
///
/// PUT /api/v1/sessions/{id}
#[instrument(skip(pool, config, req))]
pub async fn update_session(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
    req: web::Json<SessionUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Session update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let mgr = manager(pool.get_ref(), config.get_ref());
    let updated = mgr.update_session(path.into_inner(), req.to_patch()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse::from(updated))))
}

/// Delete a session
///
/// DELETE /api/v1/sessions/{id}
#[instrument(skip(pool, config))]
pub async fn delete_session(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    mgr.delete_session(path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Current cost quote for a session
///
/// GET /api/v1/sessions/{id}/cost
#[instrument(skip(pool, config))]
pub async fn get_session_cost(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    let quote = mgr.get_session_cost(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(quote)))
}

/// Reassign the session's tariff
///
/// PUT /api/v1/sessions/{id}/tariff
#[instrument(skip(pool, config, req))]
pub async fn update_session_tariff(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
    req: web::Json<SessionTariffRequest>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    let updated = mgr
        .update_session_tariff(path.into_inner(), req.tariff_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        SessionResponse::from(updated),
        "Tariff updated",
    )))
}

/// Freeze the cost of a completed session
///
/// POST /api/v1/sessions/{id}/finalize-cost
#[instrument(skip(pool, config))]
pub async fn finalize_session_cost(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    let finalized = mgr.finalize_session_cost(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        SessionResponse::from(finalized),
        "Cost finalized",
    )))
}

/// Record a payment against a session
///
/// POST /api/v1/sessions/{id}/payment
#[instrument(skip(pool, config, req))]
pub async fn process_payment(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
    req: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Payment validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let mgr = manager(pool.get_ref(), config.get_ref());
    let receipt = mgr.process_payment(path.into_inner(), req.to_input()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(receipt, "Payment received")))
}

/// Audit log for a session
///
/// GET /api/v1/sessions/{id}/logs
#[instrument(skip(pool, config))]
pub async fn get_session_logs(
    pool: web::Data<PgPool>,
    config: web::Data<ValetConfig>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let mgr = manager(pool.get_ref(), config.get_ref());
    let logs = mgr.session_logs(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(logs)))
}

/// Configure session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .route("", web::get().to(list_sessions))
            .route("", web::post().to(create_session))
            .route("/active", web::get().to(list_active_sessions))
            .route("/check-card/{card_number}", web::get().to(check_card))
            .route("/by-card/{card_number}", web::get().to(get_session_by_card))
            .route(
                "/request-return/{card_number}",
                web::post().to(request_return),
            )
            .route("/{id}", web::get().to(get_session))
            .route("/{id}", web::put().to(update_session))
            .route("/{id}", web::delete().to(delete_session))
            .route("/{id}/cost", web::get().to(get_session_cost))
            .route("/{id}/tariff", web::put().to(update_session_tariff))
            .route("/{id}/finalize-cost", web::post().to(finalize_session_cost))
            .route("/{id}/payment", web::post().to(process_payment))
            .route("/{id}/logs", web::get().to(get_session_logs)),
    );
}
