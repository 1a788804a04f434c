//! Subscription handlers
//!
//! Read-only subscription and plan endpoints. Sales and renewals happen in
//! the back office; the valet side only needs to know whether a card holds
//! resident terms.

use crate::dto::subscription::{
    SubscriptionCheckResponse, SubscriptionPlanResponse, SubscriptionResponse,
};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::{instrument, warn};
use valet_core::traits::{Repository, SubscriptionRepository};
use valet_core::AppError;
use valet_db::PgSubscriptionRepository;
use validator::Validate;

/// List subscriptions
///
/// GET /api/v1/subscriptions
#[instrument(skip(pool))]
pub async fn list_subscriptions(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let repo = PgSubscriptionRepository::new(pool.get_ref().clone());
    let subscriptions = repo.find_all(query.limit(), query.offset()).await?;
    let total = repo.count().await?;

    let data: Vec<SubscriptionResponse> = subscriptions.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(query.paginate(data, total)))
}

/// Active subscription plans
///
/// GET /api/v1/subscriptions/plans
#[instrument(skip(pool))]
pub async fn list_subscription_plans(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let repo = PgSubscriptionRepository::new(pool.get_ref().clone());
    let plans = repo.list_plans(query.limit(), query.offset()).await?;

    let data: Vec<SubscriptionPlanResponse> = plans.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Whether a client card holds resident terms today
///
/// GET /api/v1/subscriptions/by-card/{card_number}
#[instrument(skip(pool))]
pub async fn check_subscription_by_card(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let card_number = path.into_inner();

    let repo = PgSubscriptionRepository::new(pool.get_ref().clone());
    let subscription = repo.find_active_by_card(card_number.trim()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SubscriptionCheckResponse {
        card_number,
        has_subscription: subscription.is_some(),
        subscription: subscription.map(Into::into),
    })))
}

/// Get a single subscription
///
/// GET /api/v1/subscriptions/{id}
#[instrument(skip(pool))]
pub async fn get_subscription(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let subscription_id = path.into_inner();

    let repo = PgSubscriptionRepository::new(pool.get_ref().clone());
    let subscription = repo
        .find_by_id(subscription_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Subscription {}", subscription_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SubscriptionResponse::from(
        subscription,
    ))))
}

/// Configure subscription routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Literal routes before /{id} so they are not shadowed
    cfg.service(
        web::scope("/subscriptions")
            .route("", web::get().to(list_subscriptions))
            .route("/plans", web::get().to(list_subscription_plans))
            .route(
                "/by-card/{card_number}",
                web::get().to(check_subscription_by_card),
            )
            .route("/{id}", web::get().to(get_subscription)),
    );
}
