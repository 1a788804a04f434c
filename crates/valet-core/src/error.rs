//! Unified error handling for ValetPark
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.
//!
//! Note that the payment gate on car return is NOT modelled here: a session
//! that owes money produces a structured `PaymentRequired` refusal value in
//! the service layer, distinguishable from both success and error.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Business Logic Errors ====================
    #[error("Valet session not found: {0}")]
    SessionNotFound(String),

    #[error("Tariff not found: {0}")]
    TariffNotFound(String),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("Card {card} is already used by an active session (car {car})")]
    DuplicateActiveCard { card: String, car: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Cost is already finalized for this session")]
    CostAlreadyFinal,

    #[error("Cost can only be finalized for completed or cancelled sessions")]
    SessionNotCompleted,

    #[error("Session has no calculated cost to pay")]
    NoCostToPay,

    #[error("Payment exceeds outstanding balance: {remaining} remaining")]
    OverpaymentAttempt { remaining: String },

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::CostAlreadyFinal
            | AppError::SessionNotCompleted
            | AppError::NoCostToPay
            | AppError::OverpaymentAttempt { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::SessionNotFound(_)
            | AppError::TariffNotFound(_)
            | AppError::EmployeeNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict(_)
            | AppError::DuplicateActiveCard { .. }
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::SessionNotFound(_) => "session_not_found",
            AppError::TariffNotFound(_) => "tariff_not_found",
            AppError::EmployeeNotFound(_) => "employee_not_found",
            AppError::DuplicateActiveCard { .. } => "duplicate_active_card",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::CostAlreadyFinal => "cost_already_final",
            AppError::SessionNotCompleted => "session_not_completed",
            AppError::NoCostToPay => "no_cost_to_pay",
            AppError::OverpaymentAttempt { .. } => "overpayment_attempt",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::SessionNotFound("42".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DuplicateActiveCard {
                card: "C-100".to_string(),
                car: "A123BC".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::OverpaymentAttempt {
                remaining: "150.00".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: "created".to_string(),
                to: "completed".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::CostAlreadyFinal.error_code(), "cost_already_final");
        assert_eq!(AppError::NoCostToPay.error_code(), "no_cost_to_pay");
        assert_eq!(
            AppError::TariffNotFound("9".to_string()).error_code(),
            "tariff_not_found"
        );
    }
}
