//! Subscription models
//!
//! A subscription entitles a client card to resident terms: sessions created
//! for a subscribed card take the resident default tariff and skip the live
//! cost on parking. Plans describe what is sold; subscriptions are the
//! purchased instances, keyed by the client card number.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid for and usable
    #[default]
    Active,
    /// Past its end date
    Expired,
    /// Terminated before its end date
    Cancelled,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Expired => write!(f, "expired"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl SubscriptionStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "expired" => Some(SubscriptionStatus::Expired),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Subscription plan sold at a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Unique identifier
    pub id: i32,

    /// Location the plan is sold at
    pub location_id: Option<i32>,

    /// Display name
    pub name: String,

    /// Sale description
    pub description: Option<String>,

    /// Monthly price
    pub price_per_month: Decimal,

    /// Shortest purchasable term in months
    pub min_duration_months: Option<i32>,

    /// Longest purchasable term in months
    pub max_duration_months: Option<i32>,

    /// Whether the plan can currently be sold
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            location_id: None,
            name: String::new(),
            description: None,
            price_per_month: Decimal::ZERO,
            min_duration_months: None,
            max_duration_months: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Purchased subscription entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier
    pub id: i32,

    /// Plan this subscription was purchased under
    pub plan_id: Option<i32>,

    /// Location the subscription belongs to
    pub location_id: Option<i32>,

    /// Client name
    pub client_name: Option<String>,

    /// Client phone
    pub client_phone: Option<String>,

    /// Client card number the subscription is keyed by
    pub client_card_number: String,

    /// Car plate number on record
    pub car_number: Option<String>,

    /// Car model on record
    pub car_model: Option<String>,

    /// First day of validity
    pub start_date: Option<NaiveDate>,

    /// Last day of validity (None = open-ended)
    pub end_date: Option<NaiveDate>,

    /// Visits consumed so far
    pub visits_used: i32,

    /// Lifecycle status
    pub status: SubscriptionStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for Subscription {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            plan_id: None,
            location_id: None,
            client_name: None,
            client_phone: None,
            client_card_number: String::new(),
            car_number: None,
            car_model: None,
            start_date: None,
            end_date: None,
            visits_used: 0,
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Subscription {
    /// Whether the subscription grants resident terms on the given day
    ///
    /// Requires active status and the day to fall inside the validity
    /// window; an unset boundary is unbounded on that side.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.status == SubscriptionStatus::Active
            && self.start_date.map_or(true, |d| d <= today)
            && self.end_date.map_or(true, |d| d >= today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            SubscriptionStatus::from_str("active"),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::from_str("CANCELLED"),
            Some(SubscriptionStatus::Cancelled)
        );
        assert_eq!(SubscriptionStatus::from_str("paused"), None);
    }

    #[test]
    fn test_is_current_validity_window() {
        let sub = Subscription {
            start_date: Some(date(2026, 1, 1)),
            end_date: Some(date(2026, 6, 30)),
            ..Default::default()
        };

        assert!(sub.is_current(date(2026, 3, 15)));
        assert!(sub.is_current(date(2026, 6, 30)));
        assert!(!sub.is_current(date(2026, 7, 1)));
        assert!(!sub.is_current(date(2025, 12, 31)));
    }

    #[test]
    fn test_is_current_requires_active_status() {
        let cancelled = Subscription {
            status: SubscriptionStatus::Cancelled,
            ..Default::default()
        };
        assert!(!cancelled.is_current(date(2026, 3, 15)));

        let open_ended = Subscription::default();
        assert!(open_ended.is_current(date(2026, 3, 15)));
    }
}
