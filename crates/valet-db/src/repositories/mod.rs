//! Repository implementations
//!
//! This module contains concrete implementations of all repository traits
//! defined in valet-core, using sqlx for PostgreSQL access.

pub mod employee_repo;
pub mod location_repo;
pub mod session_log_repo;
pub mod session_repo;
pub mod subscription_repo;
pub mod tariff_repo;

pub use employee_repo::PgEmployeeRepository;
pub use location_repo::PgLocationRepository;
pub use session_log_repo::PgSessionLogRepository;
pub use session_repo::PgSessionRepository;
pub use subscription_repo::PgSubscriptionRepository;
pub use tariff_repo::PgTariffRepository;
