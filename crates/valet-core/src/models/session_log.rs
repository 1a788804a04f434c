//! Session audit log model
//!
//! Append-only history of everything that happened to a valet session, shown
//! to dispatchers and used for dispute resolution. Entries are never mutated
//! after creation.

use crate::models::session::SessionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action recorded in a session log entry
///
/// One variant per status transition, plus auxiliary events that do not
/// change the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Created,
    CarAccepted,
    EnRoute,
    Parked,
    ReturnRequested,
    ReturnAccepted,
    ReturnStarted,
    ReturnDelivering,
    Completed,
    Cancelled,
    /// A cost was computed and persisted
    CostCalculated,
    /// A payment was received
    PaymentReceived,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::Created => write!(f, "created"),
            SessionAction::CarAccepted => write!(f, "car_accepted"),
            SessionAction::EnRoute => write!(f, "en_route"),
            SessionAction::Parked => write!(f, "parked"),
            SessionAction::ReturnRequested => write!(f, "return_requested"),
            SessionAction::ReturnAccepted => write!(f, "return_accepted"),
            SessionAction::ReturnStarted => write!(f, "return_started"),
            SessionAction::ReturnDelivering => write!(f, "return_delivering"),
            SessionAction::Completed => write!(f, "completed"),
            SessionAction::Cancelled => write!(f, "cancelled"),
            SessionAction::CostCalculated => write!(f, "cost_calculated"),
            SessionAction::PaymentReceived => write!(f, "payment_received"),
        }
    }
}

impl SessionAction {
    /// Canonical human-readable description for the action
    pub fn description(&self) -> &'static str {
        match self {
            SessionAction::Created => "Valet session created",
            SessionAction::CarAccepted => "Car accepted from client",
            SessionAction::EnRoute => "En route to parking",
            SessionAction::Parked => "Car parked",
            SessionAction::ReturnRequested => "Client requested car return",
            SessionAction::ReturnAccepted => "Valet accepted the return request",
            SessionAction::ReturnStarted => "Valet picked the car up from parking",
            SessionAction::ReturnDelivering => "Car is being delivered to the client",
            SessionAction::Completed => "Car handed back to client",
            SessionAction::Cancelled => "Session cancelled",
            SessionAction::CostCalculated => "Parking cost calculated",
            SessionAction::PaymentReceived => "Payment received",
        }
    }

    /// The action recorded when a session enters the given status
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Created => SessionAction::Created,
            SessionStatus::CarAccepted => SessionAction::CarAccepted,
            SessionStatus::EnRoute => SessionAction::EnRoute,
            SessionStatus::Parked => SessionAction::Parked,
            SessionStatus::ReturnRequested => SessionAction::ReturnRequested,
            SessionStatus::ReturnAccepted => SessionAction::ReturnAccepted,
            SessionStatus::ReturnStarted => SessionAction::ReturnStarted,
            SessionStatus::ReturnDelivering => SessionAction::ReturnDelivering,
            SessionStatus::Completed => SessionAction::Completed,
            SessionStatus::Cancelled => SessionAction::Cancelled,
        }
    }
}

/// Session log entry entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogEntry {
    /// Unique identifier
    pub id: i64,

    /// Session this entry belongs to
    pub session_id: i32,

    /// Employee who performed the action (None = system-generated)
    pub employee_id: Option<i32>,

    /// Action code
    pub action: SessionAction,

    /// Human-readable description
    pub description: String,

    /// Optional free-form details
    pub details: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl SessionLogEntry {
    /// Build a new entry with the canonical description for its action
    pub fn new(
        session_id: i32,
        employee_id: Option<i32>,
        action: SessionAction,
        details: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            session_id,
            employee_id,
            action,
            description: action.description().to_string(),
            details,
            created_at: Utc::now(),
        }
    }
}

/// Log entry joined with the acting employee's name, for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionLogView {
    /// Entry identifier
    pub id: i64,

    /// Action code
    pub action: SessionAction,

    /// Human-readable description
    pub description: String,

    /// Full name of the acting employee ("System" when none)
    pub employee_name: String,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Optional free-form details
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_for_status_round_trip() {
        for status in SessionStatus::ACTIVE {
            let action = SessionAction::for_status(status);
            assert_eq!(action.to_string(), status.to_string());
        }
        assert_eq!(
            SessionAction::for_status(SessionStatus::Completed),
            SessionAction::Completed
        );
    }

    #[test]
    fn test_new_entry_uses_canonical_description() {
        let entry = SessionLogEntry::new(7, Some(3), SessionAction::Parked, None);
        assert_eq!(entry.session_id, 7);
        assert_eq!(entry.description, "Car parked");
        assert!(entry.details.is_none());
    }

    #[test]
    fn test_auxiliary_actions() {
        assert_eq!(SessionAction::CostCalculated.to_string(), "cost_calculated");
        assert_eq!(
            SessionAction::PaymentReceived.description(),
            "Payment received"
        );
    }
}
