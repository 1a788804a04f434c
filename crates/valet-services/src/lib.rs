//! Business logic services for ValetPark
//!
//! This crate contains the services that orchestrate valet operations:
//! cost calculation and persistence, the session lifecycle, and tariff
//! administration.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service owns its dependencies (repositories, config)
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Services
//!
//! - `CostService` - Cost quoting, caching and finalization
//! - `SessionManager` - Valet session lifecycle, payment gate and ledger
//! - `TariffService` - Tariff CRUD, defaults and cache invalidation

pub mod cost;
pub mod session_manager;
pub mod tariff_admin;

#[cfg(test)]
pub(crate) mod test_support;

pub use cost::{CostQuote, CostService};
pub use session_manager::{
    CreateSessionInput, PaymentInput, PaymentReceipt, ReturnRequestOutcome, SessionManager,
};
pub use tariff_admin::{TariffService, TariffUpdate};

/// Business logic constants
pub mod constants {
    /// Attempts to find a free session number before giving up
    pub const SESSION_NUMBER_MAX_ATTEMPTS: u32 = 10;

    /// Default page size for session listings
    pub const DEFAULT_LIST_LIMIT: i64 = 50;

    /// Hard cap on session listing page size
    pub const MAX_LIST_LIMIT: i64 = 500;
}
