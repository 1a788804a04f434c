//! Tariff DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use valet_core::models::{CostCalculation, Tariff, TariffType};
use valet_services::TariffUpdate;
use validator::Validate;

/// Deserialize so an absent field stays `None` while an explicit `null`
/// becomes `Some(None)`, letting updates clear a nullable column.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Request body for creating a tariff
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TariffCreateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub description: Option<String>,

    pub tariff_type: TariffType,

    #[serde(default)]
    pub price_per_hour: Decimal,

    #[serde(default)]
    pub price_per_day: Decimal,

    #[serde(default = "default_minimum_hours")]
    #[validate(range(min = 0))]
    pub minimum_hours: i32,

    #[validate(range(min = 1))]
    pub maximum_hours: Option<i32>,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub free_minutes: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_default_for_residents: bool,

    #[serde(default)]
    pub is_default_for_guests: bool,
}

fn default_minimum_hours() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

impl TariffCreateRequest {
    /// Convert into the domain entity
    pub fn to_tariff(&self) -> Tariff {
        Tariff {
            name: self.name.clone(),
            description: self.description.clone(),
            tariff_type: self.tariff_type,
            price_per_hour: self.price_per_hour,
            price_per_day: self.price_per_day,
            minimum_hours: self.minimum_hours,
            maximum_hours: self.maximum_hours,
            free_minutes: self.free_minutes,
            is_active: self.is_active,
            is_default_for_residents: self.is_default_for_residents,
            is_default_for_guests: self.is_default_for_guests,
            ..Default::default()
        }
    }
}

/// Request body for updating a tariff; omitted fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TariffUpdateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub tariff_type: Option<TariffType>,

    pub price_per_hour: Option<Decimal>,

    pub price_per_day: Option<Decimal>,

    #[validate(range(min = 0))]
    pub minimum_hours: Option<i32>,

    /// Absent = untouched, `null` = remove the cap, number = new cap
    #[serde(default, deserialize_with = "double_option")]
    pub maximum_hours: Option<Option<i32>>,

    #[validate(range(min = 0))]
    pub free_minutes: Option<i32>,

    pub is_active: Option<bool>,

    pub is_default_for_residents: Option<bool>,

    pub is_default_for_guests: Option<bool>,
}

impl TariffUpdateRequest {
    /// Convert into the service-layer partial update
    pub fn to_update(&self) -> TariffUpdate {
        TariffUpdate {
            name: self.name.clone(),
            description: self.description.clone(),
            tariff_type: self.tariff_type,
            price_per_hour: self.price_per_hour,
            price_per_day: self.price_per_day,
            minimum_hours: self.minimum_hours,
            maximum_hours: self.maximum_hours,
            free_minutes: self.free_minutes,
            is_active: self.is_active,
            is_default_for_residents: self.is_default_for_residents,
            is_default_for_guests: self.is_default_for_guests,
        }
    }
}

/// Tariff response body
#[derive(Debug, Clone, Serialize)]
pub struct TariffResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub tariff_type: TariffType,
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
    pub minimum_hours: i32,
    pub maximum_hours: Option<i32>,
    pub free_minutes: i32,
    pub is_active: bool,
    pub is_default_for_residents: bool,
    pub is_default_for_guests: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tariff> for TariffResponse {
    fn from(t: Tariff) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            tariff_type: t.tariff_type,
            price_per_hour: t.price_per_hour,
            price_per_day: t.price_per_day,
            minimum_hours: t.minimum_hours,
            maximum_hours: t.maximum_hours,
            free_minutes: t.free_minutes,
            is_active: t.is_active,
            is_default_for_residents: t.is_default_for_residents,
            is_default_for_guests: t.is_default_for_guests,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Request body for a stateless cost quote
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CalculationRequest {
    pub tariff_id: i32,

    /// Stay duration in hours (fractional allowed)
    pub duration_hours: Decimal,

    #[serde(default)]
    pub has_subscription: bool,
}

/// Stateless cost quote response
#[derive(Debug, Clone, Serialize)]
pub struct CalculationResponse {
    pub tariff_id: i32,
    pub total_cost: Decimal,
    pub billable_hours: i64,
    pub tariff_type: TariffType,
    pub breakdown: serde_json::Value,
}

impl CalculationResponse {
    /// Build from a calculator result
    pub fn from_calculation(tariff_id: i32, calc: &CostCalculation) -> Self {
        Self {
            tariff_id,
            total_cost: calc.total_cost,
            billable_hours: calc.billable_hours,
            tariff_type: calc.tariff_type,
            breakdown: serde_json::to_value(&calc.breakdown).unwrap_or_default(),
        }
    }
}

/// Query parameters for the auto-tariff lookup
#[derive(Debug, Clone, Deserialize)]
pub struct AutoTariffParams {
    #[serde(default)]
    pub has_subscription: bool,
}

/// Query parameters for tariff listing
#[derive(Debug, Clone, Deserialize)]
pub struct TariffFilterParams {
    /// Restrict to active tariffs
    #[serde(default)]
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_validation() {
        let valid = TariffCreateRequest {
            name: "Guest Standard".to_string(),
            description: None,
            tariff_type: TariffType::Hourly,
            price_per_hour: dec!(100),
            price_per_day: dec!(0),
            minimum_hours: 1,
            maximum_hours: None,
            free_minutes: 15,
            is_active: true,
            is_default_for_residents: false,
            is_default_for_guests: true,
        };
        assert!(valid.validate().is_ok());

        let invalid = TariffCreateRequest {
            name: String::new(),
            free_minutes: -5,
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_update_request_to_update() {
        let req = TariffUpdateRequest {
            price_per_hour: Some(dec!(150)),
            maximum_hours: Some(Some(12)),
            ..Default::default()
        };
        let update = req.to_update();
        assert_eq!(update.price_per_hour, Some(dec!(150)));
        assert_eq!(update.maximum_hours, Some(Some(12)));
        assert!(update.name.is_none());
    }

    #[test]
    fn test_update_request_maximum_hours_tristate() {
        let absent: TariffUpdateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.maximum_hours, None);

        let cleared: TariffUpdateRequest =
            serde_json::from_str(r#"{"maximum_hours": null}"#).unwrap();
        assert_eq!(cleared.maximum_hours, Some(None));

        let capped: TariffUpdateRequest =
            serde_json::from_str(r#"{"maximum_hours": 12}"#).unwrap();
        assert_eq!(capped.maximum_hours, Some(Some(12)));
    }
}
