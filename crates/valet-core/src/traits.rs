//! Common traits for repositories and services
//!
//! Defines abstractions for database access so the business logic can be
//! exercised against mocks in tests.

use crate::error::AppError;
use crate::models::{
    Employee, Location, ParkingLot, SessionLogEntry, SessionLogView, SessionStatus, Subscription,
    SubscriptionPlan, Tariff, ValetSession,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    /// Count total entities
    async fn count(&self) -> Result<i64, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// Audience a default tariff applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAudience {
    /// Subscribed clients
    Residents,
    /// Clients without a subscription
    Guests,
}

/// Tariff repository trait with specialized methods
///
/// `create` and `update` must clear the matching default flag on all other
/// active tariffs inside the same transaction whenever a default flag is set,
/// so the default relation stays single-valued.
#[async_trait]
pub trait TariffRepository: Repository<Tariff, i32> {
    /// Active tariffs only, paginated
    async fn find_active(&self, limit: i64, offset: i64) -> Result<Vec<Tariff>, AppError>;

    /// Active tariffs of one pricing type
    async fn find_by_type(&self, tariff_type: &str) -> Result<Vec<Tariff>, AppError>;

    /// The active default tariff for the given audience, if configured
    async fn find_default(&self, audience: DefaultAudience) -> Result<Option<Tariff>, AppError>;

    /// Mark a tariff as the default for an audience, clearing all others
    async fn set_default(&self, id: i32, audience: DefaultAudience) -> Result<Tariff, AppError>;
}

/// Fields that can be patched on a session without touching cost or payment
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub employee_id: Option<i32>,
    pub request_accepted_by_id: Option<i32>,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_card_number: Option<String>,
    pub parking_spot: Option<String>,
    pub parking_card: Option<String>,
    pub has_subscription: Option<bool>,
    pub notes: Option<String>,
    pub status: Option<SessionStatus>,
    pub car_photos_urls: Option<String>,
    pub parking_photos_urls: Option<String>,
    pub return_start_photos_urls: Option<String>,
    pub return_delivery_photos_urls: Option<String>,
}

/// Persisted result of a cost calculation
#[derive(Debug, Clone)]
pub struct CostUpdate {
    pub calculated_cost: Option<Decimal>,
    pub cost_calculation_details: Option<JsonValue>,
    pub cost_calculated_at: Option<DateTime<Utc>>,
    pub is_cost_final: bool,
}

/// Result of an atomically recorded payment
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Session state after the payment
    pub session: ValetSession,
    /// Amount actually received (the outstanding balance when defaulted)
    pub amount_received: Decimal,
}

/// Valet session repository trait with specialized methods
#[async_trait]
pub trait SessionRepository: Repository<ValetSession, i32> {
    /// The active session using the given client card, if any
    async fn find_active_by_card(&self, card_number: &str)
        -> Result<Option<ValetSession>, AppError>;

    /// The parked session for the given client card, if any
    async fn find_parked_by_card(&self, card_number: &str)
        -> Result<Option<ValetSession>, AppError>;

    /// Sessions filtered by search text and/or status, newest first
    async fn list_filtered(
        &self,
        search: Option<&str>,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ValetSession>, i64), AppError>;

    /// All non-terminal sessions, newest first
    async fn list_active(&self, limit: i64) -> Result<Vec<ValetSession>, AppError>;

    /// Sessions assigned to an employee, optionally filtered by status
    async fn list_by_employee(
        &self,
        employee_id: i32,
        status: Option<SessionStatus>,
    ) -> Result<Vec<ValetSession>, AppError>;

    /// Apply a partial update; None fields are left untouched
    async fn apply_patch(&self, id: i32, patch: &SessionPatch) -> Result<ValetSession, AppError>;

    /// Persist a cost calculation
    async fn save_cost(&self, id: i32, cost: &CostUpdate) -> Result<ValetSession, AppError>;

    /// Record a payment atomically
    ///
    /// The read-modify-write of the running total must hold a row lock so
    /// two concurrent payments cannot both pass the overpayment check.
    /// `amount` defaults to the outstanding balance; overpayment and a
    /// missing calculated cost are rejected.
    async fn add_payment(
        &self,
        id: i32,
        amount: Option<Decimal>,
        payment_method: &str,
        payment_reference: Option<&str>,
    ) -> Result<PaymentOutcome, AppError>;

    /// Reassign the session's tariff
    async fn set_tariff(&self, id: i32, tariff_id: i32) -> Result<ValetSession, AppError>;

    /// Clear cached cost fields on open, non-finalized sessions using a tariff
    ///
    /// Ended sessions are never swept, even when their cost was not yet
    /// frozen. Returns the number of sessions reset; the next cost read
    /// recomputes from scratch.
    async fn reset_costs_for_tariff(&self, tariff_id: i32) -> Result<i64, AppError>;

    /// Whether a generated session number is already taken
    async fn session_number_exists(&self, session_number: &str) -> Result<bool, AppError>;
}

/// Session log repository trait
///
/// The log is append-only; there is no update or delete.
#[async_trait]
pub trait SessionLogRepository: Send + Sync {
    /// Append one entry
    async fn append(&self, entry: &SessionLogEntry) -> Result<SessionLogEntry, AppError>;

    /// Entries for a session joined with employee names, newest first
    async fn list_for_session(&self, session_id: i32) -> Result<Vec<SessionLogView>, AppError>;
}

/// Employee repository trait with specialized methods
#[async_trait]
pub trait EmployeeRepository: Repository<Employee, i32> {
    /// Find employee by e-mail
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, AppError>;
}

/// Location repository trait with specialized methods
#[async_trait]
pub trait LocationRepository: Repository<Location, i32> {
    /// Parking lots attached to a location
    async fn find_lots(&self, location_id: i32) -> Result<Vec<ParkingLot>, AppError>;
}

/// Subscription repository trait with specialized methods
///
/// Plans are sold and administered in the back office; this service reads
/// them alongside the purchased subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Repository<Subscription, i32> {
    /// The subscription granting resident terms to a card today, if any
    async fn find_active_by_card(
        &self,
        card_number: &str,
    ) -> Result<Option<Subscription>, AppError>;

    /// Active subscription plans, paginated
    async fn list_plans(&self, limit: i64, offset: i64)
        -> Result<Vec<SubscriptionPlan>, AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 1000),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);

        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination::new(0, 10); // page 0 becomes 1
        assert_eq!(p.page, 1);

        let p = Pagination::new(1, 2000); // per_page capped at 1000
        assert_eq!(p.per_page, 1000);
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(95, 1, 10);
        assert_eq!(meta.total_pages, 10);

        let meta = PaginationMeta::new(101, 1, 10);
        assert_eq!(meta.total_pages, 11);
    }
}
