//! Valet session model and status state machine
//!
//! A valet session tracks one vehicle from drop-off to return. Status
//! progression is validated against an explicit transition table; anything
//! not in the table is rejected with a distinct error kind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Valet session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session registered, car not yet handed over
    #[default]
    Created,
    /// Valet accepted the car from the client
    CarAccepted,
    /// Valet is driving the car to the lot
    EnRoute,
    /// Car is parked
    Parked,
    /// Client requested the car back (payment gate passed)
    ReturnRequested,
    /// A valet accepted the return request
    ReturnAccepted,
    /// Valet picked the car up from its spot
    ReturnStarted,
    /// Car is being driven to the hand-over point
    ReturnDelivering,
    /// Car handed back to the client (terminal)
    Completed,
    /// Session aborted (terminal)
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Created => write!(f, "created"),
            SessionStatus::CarAccepted => write!(f, "car_accepted"),
            SessionStatus::EnRoute => write!(f, "en_route"),
            SessionStatus::Parked => write!(f, "parked"),
            SessionStatus::ReturnRequested => write!(f, "return_requested"),
            SessionStatus::ReturnAccepted => write!(f, "return_accepted"),
            SessionStatus::ReturnStarted => write!(f, "return_started"),
            SessionStatus::ReturnDelivering => write!(f, "return_delivering"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl SessionStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(SessionStatus::Created),
            "car_accepted" => Some(SessionStatus::CarAccepted),
            "en_route" => Some(SessionStatus::EnRoute),
            "parked" => Some(SessionStatus::Parked),
            "return_requested" => Some(SessionStatus::ReturnRequested),
            "return_accepted" => Some(SessionStatus::ReturnAccepted),
            "return_started" => Some(SessionStatus::ReturnStarted),
            "return_delivering" => Some(SessionStatus::ReturnDelivering),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    /// All statuses counting toward the one-active-session-per-card rule
    pub const ACTIVE: [SessionStatus; 8] = [
        SessionStatus::Created,
        SessionStatus::CarAccepted,
        SessionStatus::EnRoute,
        SessionStatus::Parked,
        SessionStatus::ReturnRequested,
        SessionStatus::ReturnAccepted,
        SessionStatus::ReturnStarted,
        SessionStatus::ReturnDelivering,
    ];

    /// Whether the session is still in progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the status ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// The single allowed successor in the forward flow, if any
    fn next_in_flow(&self) -> Option<SessionStatus> {
        match self {
            SessionStatus::Created => Some(SessionStatus::CarAccepted),
            SessionStatus::CarAccepted => Some(SessionStatus::EnRoute),
            SessionStatus::EnRoute => Some(SessionStatus::Parked),
            SessionStatus::Parked => Some(SessionStatus::ReturnRequested),
            SessionStatus::ReturnRequested => Some(SessionStatus::ReturnAccepted),
            SessionStatus::ReturnAccepted => Some(SessionStatus::ReturnStarted),
            SessionStatus::ReturnStarted => Some(SessionStatus::ReturnDelivering),
            SessionStatus::ReturnDelivering => Some(SessionStatus::Completed),
            SessionStatus::Completed | SessionStatus::Cancelled => None,
        }
    }

    /// Transition table: forward flow one step at a time, plus cancellation
    /// from any non-terminal status.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        if next == SessionStatus::Cancelled {
            return !self.is_terminal();
        }
        self.next_in_flow() == Some(next)
    }
}

/// Payment status derived from the paid amount and calculated cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet
    #[default]
    Pending,
    /// Partially paid
    Partial,
    /// Fully paid
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Partial => write!(f, "partial"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

impl PaymentStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "partial" => Some(PaymentStatus::Partial),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }

    /// Derive the status from a paid total against a calculated cost
    pub fn derive(paid: Decimal, cost: Decimal) -> Self {
        if paid >= cost && cost > Decimal::ZERO {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

/// One photo in a photo group, reconstructed from the stored URL list
///
/// No per-photo identifier is persisted, so the id is the 1-based position
/// within its group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoData {
    /// Positional identifier within the group ("1", "2", ...)
    pub id: String,

    /// URL of the stored photo
    pub url: String,

    /// File name derived from the URL
    pub filename: Option<String>,
}

/// Split a comma-joined URL column back into ordered photos
pub fn photos_from_urls(urls: Option<&str>) -> Vec<PhotoData> {
    let Some(urls) = urls else {
        return Vec::new();
    };

    urls.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .enumerate()
        .map(|(i, url)| PhotoData {
            id: (i + 1).to_string(),
            url: url.to_string(),
            filename: url.rsplit('/').next().map(str::to_string),
        })
        .collect()
}

/// Join photo URLs into the comma-separated storage form
pub fn photos_to_urls(photos: &[PhotoData]) -> Option<String> {
    if photos.is_empty() {
        return None;
    }
    Some(
        photos
            .iter()
            .map(|p| p.url.as_str())
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Valet session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValetSession {
    /// Unique identifier
    pub id: i32,

    /// Valet driving the session
    pub employee_id: Option<i32>,

    /// Valet who accepted the return request
    pub request_accepted_by_id: Option<i32>,

    /// Car plate number
    pub car_number: String,

    /// Car model
    pub car_model: Option<String>,

    /// Car color
    pub car_color: Option<String>,

    /// Client name
    pub client_name: Option<String>,

    /// Client phone
    pub client_phone: Option<String>,

    /// Client card number; at most one active session per card
    pub client_card_number: Option<String>,

    /// Parking spot label
    pub parking_spot: Option<String>,

    /// Physical parking card handed to the client
    pub parking_card: Option<String>,

    /// Whether the client holds an active subscription
    pub has_subscription: bool,

    /// Free-form notes
    pub notes: Option<String>,

    /// Current lifecycle status
    pub status: SessionStatus,

    /// Human-facing session number
    pub session_number: Option<String>,

    /// Assigned tariff (auto-assigned at creation when absent)
    pub tariff_id: Option<i32>,

    /// Photo URLs at car acceptance (comma-joined)
    pub car_photos_urls: Option<String>,

    /// Photo URLs taken at the parking spot
    pub parking_photos_urls: Option<String>,

    /// Photo URLs before the return drive
    pub return_start_photos_urls: Option<String>,

    /// Photo URLs at hand-over
    pub return_delivery_photos_urls: Option<String>,

    /// Cached calculated cost (None forces recomputation on next read)
    pub calculated_cost: Option<Decimal>,

    /// Structured calculation breakdown (JSON)
    pub cost_calculation_details: Option<JsonValue>,

    /// When the cached cost was computed
    pub cost_calculated_at: Option<DateTime<Utc>>,

    /// Once true, calculated_cost and tariff_id are immutable
    pub is_cost_final: bool,

    /// Derived payment status
    pub payment_status: PaymentStatus,

    /// Payment method of the latest payment
    pub payment_method: Option<String>,

    /// Running total of received payments
    pub paid_amount: Decimal,

    /// When the latest payment was received
    pub payment_date: Option<DateTime<Utc>>,

    /// External transaction or receipt reference
    pub payment_reference: Option<String>,

    /// Creation timestamp (start of the billing interval)
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (end of the billing interval once terminal)
    pub updated_at: DateTime<Utc>,
}

impl Default for ValetSession {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            employee_id: None,
            request_accepted_by_id: None,
            car_number: String::new(),
            car_model: None,
            car_color: None,
            client_name: None,
            client_phone: None,
            client_card_number: None,
            parking_spot: None,
            parking_card: None,
            has_subscription: false,
            notes: None,
            status: SessionStatus::Created,
            session_number: None,
            tariff_id: None,
            car_photos_urls: None,
            parking_photos_urls: None,
            return_start_photos_urls: None,
            return_delivery_photos_urls: None,
            calculated_cost: None,
            cost_calculation_details: None,
            cost_calculated_at: None,
            is_cost_final: false,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            paid_amount: Decimal::ZERO,
            payment_date: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ValetSession {
    /// Amount still owed against the calculated cost
    #[inline]
    pub fn outstanding_balance(&self) -> Decimal {
        (self.calculated_cost.unwrap_or(Decimal::ZERO) - self.paid_amount).max(Decimal::ZERO)
    }

    /// Whether the payment gate blocks a return request
    pub fn owes_payment(&self) -> bool {
        self.outstanding_balance() > Decimal::ZERO && self.payment_status != PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_forward_flow_transitions() {
        use SessionStatus::*;

        let flow = [
            Created,
            CarAccepted,
            EnRoute,
            Parked,
            ReturnRequested,
            ReturnAccepted,
            ReturnStarted,
            ReturnDelivering,
            Completed,
        ];

        for pair in flow.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        use SessionStatus::*;

        assert!(!Created.can_transition_to(Completed));
        assert!(!Created.can_transition_to(Parked));
        assert!(!Parked.can_transition_to(Completed));
        assert!(!CarAccepted.can_transition_to(Created));
        assert!(!ReturnRequested.can_transition_to(Parked));
    }

    #[test]
    fn test_cancel_from_any_active_status() {
        for status in SessionStatus::ACTIVE {
            assert!(status.can_transition_to(SessionStatus::Cancelled));
        }
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Cancelled));
        assert!(!SessionStatus::Cancelled.can_transition_to(SessionStatus::Created));
    }

    #[test]
    fn test_active_and_terminal() {
        assert!(SessionStatus::Parked.is_active());
        assert!(SessionStatus::ReturnDelivering.is_active());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert_eq!(SessionStatus::ACTIVE.len(), 8);
    }

    #[test]
    fn test_payment_status_derivation() {
        assert_eq!(
            PaymentStatus::derive(dec!(0), dec!(500)),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::derive(dec!(200), dec!(500)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::derive(dec!(500), dec!(500)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_outstanding_balance() {
        let session = ValetSession {
            calculated_cost: Some(dec!(500)),
            paid_amount: dec!(200),
            ..Default::default()
        };
        assert_eq!(session.outstanding_balance(), dec!(300));
        assert!(session.owes_payment());

        let paid = ValetSession {
            calculated_cost: Some(dec!(500)),
            paid_amount: dec!(500),
            payment_status: PaymentStatus::Paid,
            ..Default::default()
        };
        assert_eq!(paid.outstanding_balance(), dec!(0));
        assert!(!paid.owes_payment());

        let uncosted = ValetSession::default();
        assert_eq!(uncosted.outstanding_balance(), dec!(0));
        assert!(!uncosted.owes_payment());
    }

    #[test]
    fn test_photo_url_round_trip() {
        let photos = photos_from_urls(Some("/u/a.jpg, /u/b.jpg,,/u/c.jpg"));
        assert_eq!(photos.len(), 3);
        assert_eq!(photos[0].id, "1");
        assert_eq!(photos[2].id, "3");
        assert_eq!(photos[1].filename.as_deref(), Some("b.jpg"));

        let joined = photos_to_urls(&photos);
        assert_eq!(joined.as_deref(), Some("/u/a.jpg,/u/b.jpg,/u/c.jpg"));

        assert!(photos_from_urls(None).is_empty());
        assert!(photos_to_urls(&[]).is_none());
    }
}
