//! Subscription DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use valet_core::models::{Subscription, SubscriptionPlan, SubscriptionStatus};

/// Subscription response body
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: i32,
    pub plan_id: Option<i32>,
    pub location_id: Option<i32>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_card_number: String,
    pub car_number: Option<String>,
    pub car_model: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub visits_used: i32,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            plan_id: s.plan_id,
            location_id: s.location_id,
            client_name: s.client_name,
            client_phone: s.client_phone,
            client_card_number: s.client_card_number,
            car_number: s.car_number,
            car_model: s.car_model,
            start_date: s.start_date,
            end_date: s.end_date,
            visits_used: s.visits_used,
            status: s.status,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Subscription plan response body
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPlanResponse {
    pub id: i32,
    pub location_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub price_per_month: Decimal,
    pub min_duration_months: Option<i32>,
    pub max_duration_months: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionPlan> for SubscriptionPlanResponse {
    fn from(p: SubscriptionPlan) -> Self {
        Self {
            id: p.id,
            location_id: p.location_id,
            name: p.name,
            description: p.description,
            price_per_month: p.price_per_month,
            min_duration_months: p.min_duration_months,
            max_duration_months: p.max_duration_months,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Result of a subscription lookup for a client card
///
/// Dispatchers use this before opening a session to decide whether the
/// client gets resident terms.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionCheckResponse {
    pub card_number: String,
    pub has_subscription: bool,
    pub subscription: Option<SubscriptionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_response_serializes_status() {
        let check = SubscriptionCheckResponse {
            card_number: "C-100".to_string(),
            has_subscription: true,
            subscription: Some(
                Subscription {
                    id: 4,
                    client_card_number: "C-100".to_string(),
                    ..Default::default()
                }
                .into(),
            ),
        };

        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value["has_subscription"], true);
        assert_eq!(value["subscription"]["status"], "active");
    }
}
