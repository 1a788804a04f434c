//! Parking tariff model and cost calculator
//!
//! A tariff is a pricing policy for valet parking. The cost calculator is
//! pure: given a tariff, an elapsed duration and the subscription flag it
//! returns the amount owed plus a structured breakdown, with no side effects.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tariff pricing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    /// Billed per started hour after the grace period
    #[default]
    Hourly,
    /// Billed per started day
    Daily,
    /// Never billed
    Free,
    /// Hourly billing with VIP terms
    Vip,
}

impl fmt::Display for TariffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TariffType::Hourly => write!(f, "hourly"),
            TariffType::Daily => write!(f, "daily"),
            TariffType::Free => write!(f, "free"),
            TariffType::Vip => write!(f, "vip"),
        }
    }
}

impl TariffType {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hourly" => Some(TariffType::Hourly),
            "daily" => Some(TariffType::Daily),
            "free" => Some(TariffType::Free),
            "vip" => Some(TariffType::Vip),
            _ => None,
        }
    }

    /// Whether sessions under this tariff ever produce a charge
    pub fn is_chargeable(&self) -> bool {
        !matches!(self, TariffType::Free)
    }

    /// Whether the hourly formula (grace period + per-hour rounding) applies
    pub fn bills_per_hour(&self) -> bool {
        matches!(self, TariffType::Hourly | TariffType::Vip)
    }
}

/// Parking tariff entity
///
/// At most one active tariff may be the default for residents, and at most
/// one for guests. The repository enforces this by clearing the flag on all
/// other active tariffs inside the same transaction as the triggering write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique identifier
    pub id: i32,

    /// Tariff name
    pub name: String,

    /// Longer description shown to admins
    pub description: Option<String>,

    /// Pricing type
    pub tariff_type: TariffType,

    /// Price per started hour
    pub price_per_hour: Decimal,

    /// Price per started day (daily tariffs)
    pub price_per_day: Decimal,

    /// Minimum billable hours once any chargeable time exists
    pub minimum_hours: i32,

    /// Cap on billable hours (None = unlimited)
    pub maximum_hours: Option<i32>,

    /// Grace period in minutes that is never billed
    pub free_minutes: i32,

    /// Whether the tariff can be assigned to new sessions
    pub is_active: bool,

    /// Default tariff for subscribed (resident) clients
    pub is_default_for_residents: bool,

    /// Default tariff for guests
    pub is_default_for_guests: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: None,
            tariff_type: TariffType::Hourly,
            price_per_hour: Decimal::ZERO,
            price_per_day: Decimal::ZERO,
            minimum_hours: 1,
            maximum_hours: None,
            free_minutes: 0,
            is_active: true,
            is_default_for_residents: false,
            is_default_for_guests: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Structured breakdown of a cost calculation
///
/// Persisted as JSON on the session so the receipt can be shown and disputed
/// long after the tariff changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Tariff type the formula was chosen by
    pub tariff_type: TariffType,

    /// Tariff name at calculation time
    pub tariff_name: String,

    /// Elapsed duration in hours, rounded to two decimals
    pub duration_hours: Decimal,

    /// Grace minutes subtracted before billing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_minutes: Option<i32>,

    /// Whole billable hours after rounding and clamping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable_hours: Option<i64>,

    /// Hourly price applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_hour: Option<Decimal>,

    /// Billable days (daily tariffs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,

    /// Daily price applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<Decimal>,

    /// Why no charge applies (free tariffs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Total amount owed
    pub total_cost: Decimal,
}

/// Result of a cost calculation
#[derive(Debug, Clone, Serialize)]
pub struct CostCalculation {
    /// Total amount owed
    pub total_cost: Decimal,

    /// Whole billable hours (0 for free tariffs and unbilled grace time)
    pub billable_hours: i64,

    /// Tariff type used
    pub tariff_type: TariffType,

    /// Whether the value is frozen (session reached a terminal status)
    pub is_final: bool,

    /// Structured breakdown for display and dispute resolution
    pub breakdown: CostBreakdown,
}

const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86_400;

impl Tariff {
    /// Calculate the cost for a given elapsed duration
    ///
    /// Pure and deterministic: the same tariff, duration and flags always
    /// produce the same result. `is_final` is carried through to the output
    /// unchanged so callers can freeze the value on session completion.
    pub fn calculate_cost(
        &self,
        elapsed: Duration,
        has_subscription: bool,
        is_final: bool,
    ) -> CostCalculation {
        let elapsed_secs = elapsed.num_seconds().max(0);
        let duration_hours =
            (Decimal::from(elapsed_secs) / Decimal::from(SECS_PER_HOUR)).round_dp(2);

        // Free tariffs never bill; subscribed clients on a free tariff
        // short-circuit regardless of duration.
        if self.tariff_type == TariffType::Free {
            let reason = if has_subscription {
                "Free parking for residents"
            } else {
                "Free parking"
            };
            return CostCalculation {
                total_cost: Decimal::ZERO,
                billable_hours: 0,
                tariff_type: self.tariff_type,
                is_final,
                breakdown: CostBreakdown {
                    tariff_type: self.tariff_type,
                    tariff_name: self.name.clone(),
                    duration_hours,
                    free_minutes: None,
                    billable_hours: None,
                    price_per_hour: None,
                    days: None,
                    price_per_day: None,
                    reason: Some(reason.to_string()),
                    total_cost: Decimal::ZERO,
                },
            };
        }

        if self.tariff_type == TariffType::Daily {
            // Any started day bills as a full day, minimum one day.
            let days = ((elapsed_secs + SECS_PER_DAY - 1) / SECS_PER_DAY).max(1);
            let total_cost = Decimal::from(days) * self.price_per_day;
            return CostCalculation {
                total_cost,
                billable_hours: days * 24,
                tariff_type: self.tariff_type,
                is_final,
                breakdown: CostBreakdown {
                    tariff_type: self.tariff_type,
                    tariff_name: self.name.clone(),
                    duration_hours,
                    free_minutes: None,
                    billable_hours: None,
                    price_per_hour: None,
                    days: Some(days),
                    price_per_day: Some(self.price_per_day),
                    reason: None,
                    total_cost,
                },
            };
        }

        // Hourly and VIP: subtract the grace period, round any started hour
        // up to a full hour, then clamp to the configured bounds.
        let billable_hours = self.billable_hours(elapsed_secs);
        let total_cost = Decimal::from(billable_hours) * self.price_per_hour;

        CostCalculation {
            total_cost,
            billable_hours,
            tariff_type: self.tariff_type,
            is_final,
            breakdown: CostBreakdown {
                tariff_type: self.tariff_type,
                tariff_name: self.name.clone(),
                duration_hours,
                free_minutes: Some(self.free_minutes),
                billable_hours: Some(billable_hours),
                price_per_hour: Some(self.price_per_hour),
                days: None,
                price_per_day: None,
                reason: None,
                total_cost,
            },
        }
    }

    /// Whole billable hours for an elapsed duration in seconds
    ///
    /// Zero when the whole stay fits inside the grace period; otherwise at
    /// least one hour, clamped to `[minimum_hours, maximum_hours]`.
    fn billable_hours(&self, elapsed_secs: i64) -> i64 {
        let grace_secs = i64::from(self.free_minutes.max(0)) * 60;
        let billable_secs = (elapsed_secs - grace_secs).max(0);

        if billable_secs == 0 {
            return 0;
        }

        let mut hours = (billable_secs + SECS_PER_HOUR - 1) / SECS_PER_HOUR;

        if hours < i64::from(self.minimum_hours) {
            hours = i64::from(self.minimum_hours);
        }
        if let Some(max) = self.maximum_hours {
            hours = hours.min(i64::from(max));
        }

        hours
    }

    /// Minimum charge seeded on session creation
    ///
    /// Free tariffs seed zero; hourly/vip seed one hour; daily seeds one day.
    pub fn minimum_charge(&self) -> Decimal {
        match self.tariff_type {
            TariffType::Free => Decimal::ZERO,
            TariffType::Daily => self.price_per_day,
            TariffType::Hourly | TariffType::Vip => self.price_per_hour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn hourly(price: Decimal, free_minutes: i32) -> Tariff {
        Tariff {
            name: "Guest Standard".to_string(),
            tariff_type: TariffType::Hourly,
            price_per_hour: price,
            free_minutes,
            minimum_hours: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_hourly_rounds_partial_hours_up() {
        let tariff = hourly(dec!(100), 0);

        // 90 minutes bills as 2 full hours
        let calc = tariff.calculate_cost(Duration::minutes(90), false, false);
        assert_eq!(calc.billable_hours, 2);
        assert_eq!(calc.total_cost, dec!(200));

        // One minute bills as one hour
        let calc = tariff.calculate_cost(Duration::minutes(1), false, false);
        assert_eq!(calc.billable_hours, 1);
        assert_eq!(calc.total_cost, dec!(100));
    }

    #[test]
    fn test_hourly_grace_period() {
        let tariff = hourly(dec!(100), 30);

        // Entirely within the grace period: nothing billed
        let calc = tariff.calculate_cost(Duration::minutes(20), false, false);
        assert_eq!(calc.billable_hours, 0);
        assert_eq!(calc.total_cost, dec!(0));

        // One chargeable minute past the grace period bills one hour
        let calc = tariff.calculate_cost(Duration::minutes(31), false, false);
        assert_eq!(calc.billable_hours, 1);
        assert_eq!(calc.total_cost, dec!(100));

        // 2h30m with 30 minutes free bills exactly 2 hours
        let calc = tariff.calculate_cost(Duration::minutes(150), false, false);
        assert_eq!(calc.billable_hours, 2);
        assert_eq!(calc.total_cost, dec!(200));
    }

    #[test]
    fn test_hourly_minimum_and_maximum_clamp() {
        let tariff = Tariff {
            tariff_type: TariffType::Hourly,
            price_per_hour: dec!(50),
            minimum_hours: 3,
            maximum_hours: Some(10),
            ..Default::default()
        };

        // One hour elapsed, clamped up to the 3-hour minimum
        let calc = tariff.calculate_cost(Duration::hours(1), false, false);
        assert_eq!(calc.billable_hours, 3);
        assert_eq!(calc.total_cost, dec!(150));

        // 48 hours elapsed, capped at 10
        let calc = tariff.calculate_cost(Duration::hours(48), false, false);
        assert_eq!(calc.billable_hours, 10);
        assert_eq!(calc.total_cost, dec!(500));

        // Zero elapsed never triggers the minimum
        let calc = tariff.calculate_cost(Duration::zero(), false, false);
        assert_eq!(calc.billable_hours, 0);
        assert_eq!(calc.total_cost, dec!(0));
    }

    #[test]
    fn test_vip_uses_hourly_formula() {
        let tariff = Tariff {
            tariff_type: TariffType::Vip,
            price_per_hour: dec!(300),
            free_minutes: 60,
            minimum_hours: 1,
            ..Default::default()
        };

        let calc = tariff.calculate_cost(Duration::minutes(61), false, false);
        assert_eq!(calc.billable_hours, 1);
        assert_eq!(calc.total_cost, dec!(300));
    }

    #[test]
    fn test_daily_minimum_one_day() {
        let tariff = Tariff {
            tariff_type: TariffType::Daily,
            price_per_day: dec!(1000),
            ..Default::default()
        };

        // 30 minutes still bills a full day
        let calc = tariff.calculate_cost(Duration::minutes(30), false, false);
        assert_eq!(calc.breakdown.days, Some(1));
        assert_eq!(calc.total_cost, dec!(1000));

        // 25 hours bills two days
        let calc = tariff.calculate_cost(Duration::hours(25), false, false);
        assert_eq!(calc.breakdown.days, Some(2));
        assert_eq!(calc.total_cost, dec!(2000));

        // Exactly 48 hours bills two days, not three
        let calc = tariff.calculate_cost(Duration::hours(48), false, false);
        assert_eq!(calc.breakdown.days, Some(2));
        assert_eq!(calc.total_cost, dec!(2000));
    }

    #[test]
    fn test_free_tariff_never_bills() {
        let tariff = Tariff {
            name: "Resident Free".to_string(),
            tariff_type: TariffType::Free,
            price_per_hour: dec!(500), // ignored
            ..Default::default()
        };

        let calc = tariff.calculate_cost(Duration::days(14), false, false);
        assert_eq!(calc.total_cost, dec!(0));
        assert_eq!(calc.billable_hours, 0);

        let calc = tariff.calculate_cost(Duration::days(14), true, false);
        assert_eq!(calc.total_cost, dec!(0));
        assert_eq!(
            calc.breakdown.reason.as_deref(),
            Some("Free parking for residents")
        );
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let tariff = hourly(dec!(100), 15);
        let a = tariff.calculate_cost(Duration::minutes(125), false, false);
        let b = tariff.calculate_cost(Duration::minutes(125), false, false);
        assert_eq!(a.total_cost, b.total_cost);
        assert_eq!(a.billable_hours, b.billable_hours);
    }

    #[test]
    fn test_minimum_charge() {
        assert_eq!(hourly(dec!(100), 0).minimum_charge(), dec!(100));

        let daily = Tariff {
            tariff_type: TariffType::Daily,
            price_per_day: dec!(1000),
            ..Default::default()
        };
        assert_eq!(daily.minimum_charge(), dec!(1000));

        let free = Tariff {
            tariff_type: TariffType::Free,
            ..Default::default()
        };
        assert_eq!(free.minimum_charge(), dec!(0));
    }

    #[test]
    fn test_tariff_type_parse() {
        assert_eq!(TariffType::from_str("hourly"), Some(TariffType::Hourly));
        assert_eq!(TariffType::from_str("VIP"), Some(TariffType::Vip));
        assert_eq!(TariffType::from_str("weekly"), None);
        assert!(!TariffType::Free.is_chargeable());
        assert!(TariffType::Vip.bills_per_hour());
        assert!(!TariffType::Daily.bills_per_hour());
    }
}
