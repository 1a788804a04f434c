//! API layer for ValetPark
//!
//! HTTP handlers for valet sessions, parking tariffs, employees, locations
//! and subscriptions.

pub mod dto;
pub mod handlers;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

// Re-export handler configuration functions
pub use handlers::{
    configure_employees, configure_locations, configure_sessions, configure_subscriptions,
    configure_tariffs,
};
