//! ValetPark Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the ValetPark system. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for all domain entities
//! - Transaction support for default-tariff flag maintenance
//! - Bulk cached-cost invalidation when tariff pricing changes

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use sqlx::{PgPool, Postgres, Transaction};
pub use valet_core::{AppError, AppResult};
