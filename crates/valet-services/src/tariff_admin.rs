//! Tariff administration service
//!
//! Tariff CRUD, default-tariff selection and the cost-cache invalidation
//! sweep that runs when a tariff's pricing changes.

use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use valet_core::{
    config::ValetConfig,
    models::{CostCalculation, Tariff, TariffType},
    traits::{DefaultAudience, Repository, SessionRepository, TariffRepository},
    AppError, AppResult,
};

/// Resolve the automatic tariff for a client type
///
/// The configured default for the audience wins; the configurable fallback
/// tariff id is used when no default flag is set.
pub async fn auto_tariff<T: TariffRepository>(
    repo: &T,
    config: &ValetConfig,
    has_subscription: bool,
) -> AppResult<Tariff> {
    let (audience, fallback_id) = if has_subscription {
        (DefaultAudience::Residents, config.fallback_resident_tariff_id)
    } else {
        (DefaultAudience::Guests, config.fallback_guest_tariff_id)
    };

    if let Some(tariff) = repo.find_default(audience).await? {
        return Ok(tariff);
    }

    repo.find_by_id(fallback_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| {
            AppError::TariffNotFound(format!(
                "no default tariff configured (fallback id {})",
                fallback_id
            ))
        })
}

/// Partial update for a tariff; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct TariffUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tariff_type: Option<TariffType>,
    pub price_per_hour: Option<Decimal>,
    pub price_per_day: Option<Decimal>,
    pub minimum_hours: Option<i32>,
    pub maximum_hours: Option<Option<i32>>,
    pub free_minutes: Option<i32>,
    pub is_active: Option<bool>,
    pub is_default_for_residents: Option<bool>,
    pub is_default_for_guests: Option<bool>,
}

impl TariffUpdate {
    /// Whether applying this update changes how costs are computed
    fn changes_pricing(&self, current: &Tariff) -> bool {
        self.price_per_hour.is_some_and(|p| p != current.price_per_hour)
            || self.price_per_day.is_some_and(|p| p != current.price_per_day)
            || self.free_minutes.is_some_and(|m| m != current.free_minutes)
            || self.minimum_hours.is_some_and(|h| h != current.minimum_hours)
            || self.maximum_hours.is_some_and(|h| h != current.maximum_hours)
            || self.tariff_type.is_some_and(|t| t != current.tariff_type)
    }

    /// Merge into an existing tariff
    fn apply_to(&self, mut tariff: Tariff) -> Tariff {
        if let Some(v) = &self.name {
            tariff.name = v.clone();
        }
        if let Some(v) = &self.description {
            tariff.description = Some(v.clone());
        }
        if let Some(v) = self.tariff_type {
            tariff.tariff_type = v;
        }
        if let Some(v) = self.price_per_hour {
            tariff.price_per_hour = v;
        }
        if let Some(v) = self.price_per_day {
            tariff.price_per_day = v;
        }
        if let Some(v) = self.minimum_hours {
            tariff.minimum_hours = v;
        }
        if let Some(v) = self.maximum_hours {
            tariff.maximum_hours = v;
        }
        if let Some(v) = self.free_minutes {
            tariff.free_minutes = v;
        }
        if let Some(v) = self.is_active {
            tariff.is_active = v;
        }
        if let Some(v) = self.is_default_for_residents {
            tariff.is_default_for_residents = v;
        }
        if let Some(v) = self.is_default_for_guests {
            tariff.is_default_for_guests = v;
        }
        tariff
    }
}

/// Tariff administration service
pub struct TariffService<T: TariffRepository, S: SessionRepository> {
    tariff_repo: Arc<T>,
    session_repo: Arc<S>,
    config: ValetConfig,
}

impl<T: TariffRepository, S: SessionRepository> TariffService<T, S> {
    /// Create a new tariff service
    pub fn new(tariff_repo: Arc<T>, session_repo: Arc<S>, config: ValetConfig) -> Self {
        Self {
            tariff_repo,
            session_repo,
            config,
        }
    }

    /// Fetch a tariff by id
    pub async fn get(&self, id: i32) -> AppResult<Tariff> {
        self.tariff_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::TariffNotFound(id.to_string()))
    }

    /// List tariffs, optionally restricted to active ones
    pub async fn list(&self, active_only: bool, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        if active_only {
            self.tariff_repo.find_active(limit, offset).await
        } else {
            self.tariff_repo.find_all(limit, offset).await
        }
    }

    /// Active tariffs of one pricing type
    pub async fn list_by_type(&self, tariff_type: &str) -> AppResult<Vec<Tariff>> {
        let parsed = TariffType::from_str(tariff_type).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown tariff type: {}", tariff_type))
        })?;
        self.tariff_repo.find_by_type(&parsed.to_string()).await
    }

    /// Create a tariff
    ///
    /// Setting a default flag clears that flag on all other active tariffs
    /// inside the repository transaction.
    #[instrument(skip(self, tariff), fields(name = %tariff.name))]
    pub async fn create(&self, tariff: Tariff) -> AppResult<Tariff> {
        let created = self.tariff_repo.create(&tariff).await?;
        info!("Created tariff {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Update a tariff
    ///
    /// Pricing changes invalidate the cached cost on every non-finalized
    /// session using this tariff. The sweep runs after the primary commit;
    /// its failure is logged and never propagated, so the next cost read
    /// still recomputes from the session's own tariff reference.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i32, update: TariffUpdate) -> AppResult<Tariff> {
        let current = self.get(id).await?;
        let pricing_changed = update.changes_pricing(&current);

        let updated = self.tariff_repo.update(&update.apply_to(current)).await?;

        info!("Updated tariff {} ({})", updated.id, updated.name);

        if pricing_changed {
            match self.session_repo.reset_costs_for_tariff(id).await {
                Ok(count) => {
                    if count > 0 {
                        info!(
                            "Pricing change on tariff {} invalidated {} cached costs",
                            id, count
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        "Cost-cache sweep after tariff {} pricing change failed: {}",
                        id, e
                    );
                }
            }
        }

        Ok(updated)
    }

    /// Deactivate a tariff
    ///
    /// Tariffs are referenced by historical sessions, so deletion is a
    /// soft deactivation.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i32) -> AppResult<Tariff> {
        let mut tariff = self.get(id).await?;
        tariff.is_active = false;
        tariff.is_default_for_residents = false;
        tariff.is_default_for_guests = false;

        let updated = self.tariff_repo.update(&tariff).await?;
        info!("Deactivated tariff {}", id);
        Ok(updated)
    }

    /// Make a tariff the default for residents
    pub async fn set_default_for_residents(&self, id: i32) -> AppResult<Tariff> {
        self.tariff_repo
            .set_default(id, DefaultAudience::Residents)
            .await
    }

    /// Make a tariff the default for guests
    pub async fn set_default_for_guests(&self, id: i32) -> AppResult<Tariff> {
        self.tariff_repo
            .set_default(id, DefaultAudience::Guests)
            .await
    }

    /// The tariff a new session would be assigned for a client type
    pub async fn get_auto(&self, has_subscription: bool) -> AppResult<Tariff> {
        auto_tariff(self.tariff_repo.as_ref(), &self.config, has_subscription).await
    }

    /// Stateless cost quote for a hypothetical stay
    #[instrument(skip(self))]
    pub async fn calculate(
        &self,
        tariff_id: i32,
        duration_hours: Decimal,
        has_subscription: bool,
    ) -> AppResult<CostCalculation> {
        if duration_hours < Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "Duration must not be negative".to_string(),
            ));
        }

        let tariff = self.get(tariff_id).await?;

        let seconds = (duration_hours * Decimal::from(3600))
            .round()
            .to_i64()
            .ok_or_else(|| AppError::InvalidInput("Duration out of range".to_string()))?;

        Ok(tariff.calculate_cost(Duration::seconds(seconds), has_subscription, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_changes_pricing() {
        let current = Tariff {
            price_per_hour: dec!(100),
            price_per_day: dec!(800),
            free_minutes: 15,
            minimum_hours: 1,
            ..Default::default()
        };

        let update = TariffUpdate {
            price_per_hour: Some(dec!(120)),
            ..Default::default()
        };
        assert!(update.changes_pricing(&current));

        // Same value is not a pricing change
        let update = TariffUpdate {
            price_per_hour: Some(dec!(100)),
            ..Default::default()
        };
        assert!(!update.changes_pricing(&current));

        // Renaming never triggers the sweep
        let update = TariffUpdate {
            name: Some("Weekend".to_string()),
            ..Default::default()
        };
        assert!(!update.changes_pricing(&current));

        let update = TariffUpdate {
            free_minutes: Some(30),
            ..Default::default()
        };
        assert!(update.changes_pricing(&current));
    }

    #[test]
    fn test_apply_to_merges_partial_fields() {
        let current = Tariff {
            name: "Standard".to_string(),
            price_per_hour: dec!(100),
            free_minutes: 15,
            ..Default::default()
        };

        let update = TariffUpdate {
            price_per_hour: Some(dec!(150)),
            maximum_hours: Some(Some(12)),
            ..Default::default()
        };

        let merged = update.apply_to(current);
        assert_eq!(merged.name, "Standard");
        assert_eq!(merged.price_per_hour, dec!(150));
        assert_eq!(merged.maximum_hours, Some(12));
        assert_eq!(merged.free_minutes, 15);
    }
}
