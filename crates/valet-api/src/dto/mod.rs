//! Data transfer objects for the HTTP API

pub mod common;
pub mod employee;
pub mod location;
pub mod session;
pub mod subscription;
pub mod tariff;

pub use common::{ApiResponse, PaginationParams};
