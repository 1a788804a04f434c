//! Cost service
//!
//! Bridges the pure tariff calculator and the session store. Open sessions
//! get a live cost recomputed against "now" and cached on the row; ended
//! sessions (completed or cancelled) get the cost frozen against their
//! terminal timestamp. A frozen cost is never recomputed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use valet_core::{
    models::{CostCalculation, Tariff, ValetSession},
    traits::{CostUpdate, Repository, SessionRepository, TariffRepository},
    AppError, AppResult,
};

/// Cost quote for a session
#[derive(Debug, Clone, Serialize)]
pub struct CostQuote {
    /// Amount owed for the stay so far (or the frozen final amount)
    pub cost: Decimal,

    /// Structured breakdown, as persisted on the session
    pub calculation: Option<JsonValue>,

    /// Whether the amount is frozen
    pub is_final: bool,
}

/// Cost calculation and caching service
pub struct CostService<S: SessionRepository, T: TariffRepository> {
    session_repo: Arc<S>,
    tariff_repo: Arc<T>,
}

impl<S: SessionRepository, T: TariffRepository> CostService<S, T> {
    /// Create a new cost service
    pub fn new(session_repo: Arc<S>, tariff_repo: Arc<T>) -> Self {
        Self {
            session_repo,
            tariff_repo,
        }
    }

    /// End of the billing interval for a session
    ///
    /// Open sessions bill up to "now"; terminal sessions bill up to their
    /// last update, which is when they entered the terminal status.
    fn billing_end(session: &ValetSession) -> DateTime<Utc> {
        if session.status.is_terminal() {
            session.updated_at
        } else {
            Utc::now()
        }
    }

    /// Run the pure calculator for a session against its tariff
    pub fn compute(
        tariff: &Tariff,
        session: &ValetSession,
        is_final: bool,
    ) -> CostCalculation {
        let elapsed = Self::billing_end(session) - session.created_at;
        tariff.calculate_cost(elapsed, session.has_subscription, is_final)
    }

    /// Load the tariff assigned to a session
    async fn session_tariff(&self, session: &ValetSession) -> AppResult<Tariff> {
        let tariff_id = session
            .tariff_id
            .ok_or_else(|| AppError::TariffNotFound("no tariff assigned".to_string()))?;

        self.tariff_repo
            .find_by_id(tariff_id)
            .await?
            .ok_or_else(|| AppError::TariffNotFound(tariff_id.to_string()))
    }

    /// Quote the current cost for a session
    ///
    /// Finalized sessions return the cached value untouched. Open sessions
    /// recompute against "now" and persist the result so the cached columns
    /// stay current for listings. A terminal session that was never
    /// finalized (e.g. cancelled without a cost read) is frozen here, on
    /// its first read after the transition.
    #[instrument(skip(self, session), fields(session_id = session.id))]
    pub async fn quote(&self, session: &ValetSession) -> AppResult<CostQuote> {
        if session.is_cost_final {
            debug!("Session {} cost is final, returning cached value", session.id);
            return Ok(CostQuote {
                cost: session.calculated_cost.unwrap_or(Decimal::ZERO),
                calculation: session.cost_calculation_details.clone(),
                is_final: true,
            });
        }

        let freeze = session.status.is_terminal();
        let tariff = self.session_tariff(session).await?;
        let calc = Self::compute(&tariff, session, freeze);
        let details = serde_json::to_value(&calc.breakdown)?;

        let updated = self
            .session_repo
            .save_cost(
                session.id,
                &CostUpdate {
                    calculated_cost: Some(calc.total_cost),
                    cost_calculation_details: Some(details.clone()),
                    cost_calculated_at: Some(Utc::now()),
                    is_cost_final: freeze,
                },
            )
            .await?;

        debug!(
            "Quoted session {}: {} ({} billable hours)",
            updated.id, calc.total_cost, calc.billable_hours
        );

        Ok(CostQuote {
            cost: calc.total_cost,
            calculation: Some(details),
            is_final: freeze,
        })
    }

    /// Freeze the cost of an ended session
    ///
    /// Idempotent: finalizing an already-final session returns it unchanged.
    #[instrument(skip(self, session), fields(session_id = session.id))]
    pub async fn finalize(&self, session: &ValetSession) -> AppResult<ValetSession> {
        if session.is_cost_final {
            debug!("Session {} already finalized", session.id);
            return Ok(session.clone());
        }

        if !session.status.is_terminal() {
            return Err(AppError::SessionNotCompleted);
        }

        let tariff = self.session_tariff(session).await?;
        let calc = Self::compute(&tariff, session, true);
        let details = serde_json::to_value(&calc.breakdown)?;

        let updated = self
            .session_repo
            .save_cost(
                session.id,
                &CostUpdate {
                    calculated_cost: Some(calc.total_cost),
                    cost_calculation_details: Some(details),
                    cost_calculated_at: Some(Utc::now()),
                    is_cost_final: true,
                },
            )
            .await?;

        debug!("Finalized session {} at {}", updated.id, calc.total_cost);

        Ok(updated)
    }

    /// Recompute and persist the live cost, best effort
    ///
    /// Used for side-effect recalculations (e.g. the car was just parked)
    /// where a calculation failure must not abort the primary operation.
    pub async fn refresh_quietly(&self, session: &ValetSession) -> Option<CostQuote> {
        match self.quote(session).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("Cost refresh for session {} failed: {}", session.id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemorySessions, MemoryTariffs};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use valet_core::models::{SessionStatus, TariffType};
    use valet_db::{PgSessionRepository, PgTariffRepository};

    type TestCostService = CostService<PgSessionRepository, PgTariffRepository>;

    fn hourly_tariff() -> Tariff {
        Tariff {
            id: 1,
            name: "Guest Standard".to_string(),
            tariff_type: TariffType::Hourly,
            price_per_hour: dec!(100),
            free_minutes: 15,
            minimum_hours: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_compute_open_session_bills_to_now() {
        let session = ValetSession {
            created_at: Utc::now() - Duration::minutes(90),
            status: SessionStatus::Parked,
            ..Default::default()
        };

        let calc = TestCostService::compute(&hourly_tariff(), &session, false);
        // 90 minutes less 15 free = 75 minutes, billed as 2 started hours
        assert_eq!(calc.billable_hours, 2);
        assert_eq!(calc.total_cost, dec!(200));
        assert!(!calc.is_final);
    }

    #[test]
    fn test_compute_terminal_session_bills_to_updated_at() {
        let start = Utc::now() - Duration::hours(10);
        let session = ValetSession {
            created_at: start,
            updated_at: start + Duration::minutes(50),
            status: SessionStatus::Completed,
            ..Default::default()
        };

        let calc = TestCostService::compute(&hourly_tariff(), &session, true);
        // Interval is the 50 minutes up to completion, not the 10 hours
        // since creation.
        assert_eq!(calc.billable_hours, 1);
        assert_eq!(calc.total_cost, dec!(100));
        assert!(calc.is_final);
    }

    #[tokio::test]
    async fn test_quote_freezes_cancelled_session() {
        let start = Utc::now() - Duration::hours(3);
        let sessions = Arc::new(MemorySessions::with(vec![ValetSession {
            id: 1,
            status: SessionStatus::Cancelled,
            tariff_id: Some(1),
            calculated_cost: Some(dec!(100)),
            created_at: start,
            updated_at: start + Duration::hours(2),
            ..Default::default()
        }]));
        let tariffs = Arc::new(MemoryTariffs::with(vec![hourly_tariff()]));
        let service = CostService::new(Arc::clone(&sessions), tariffs);

        let quote = service.quote(&sessions.get(1).unwrap()).await.unwrap();
        // 2 hours less 15 free minutes bills 2 started hours
        assert_eq!(quote.cost, dec!(200));
        assert!(quote.is_final);
        assert!(sessions.get(1).unwrap().is_cost_final);
    }

    #[tokio::test]
    async fn test_price_change_leaves_settled_bill_alone() {
        let start = Utc::now() - Duration::hours(3);
        let cancelled = ValetSession {
            id: 1,
            status: SessionStatus::Cancelled,
            tariff_id: Some(1),
            calculated_cost: Some(dec!(100)),
            created_at: start,
            updated_at: start + Duration::hours(2),
            ..Default::default()
        };
        let parked = ValetSession {
            id: 2,
            status: SessionStatus::Parked,
            tariff_id: Some(1),
            calculated_cost: Some(dec!(100)),
            created_at: start,
            ..Default::default()
        };
        let sessions = Arc::new(MemorySessions::with(vec![cancelled, parked]));
        let tariffs = Arc::new(MemoryTariffs::with(vec![hourly_tariff()]));
        let service = CostService::new(Arc::clone(&sessions), Arc::clone(&tariffs));

        let settled = service.quote(&sessions.get(1).unwrap()).await.unwrap();
        assert_eq!(settled.cost, dec!(200));

        // Admin doubles the price; the sweep touches only the open session.
        tariffs.set_price_per_hour(1, dec!(200));
        let reset = sessions.reset_costs_for_tariff(1).await.unwrap();
        assert_eq!(reset, 1);
        assert!(sessions.get(2).unwrap().calculated_cost.is_none());

        let again = service.quote(&sessions.get(1).unwrap()).await.unwrap();
        assert_eq!(again.cost, dec!(200));
        assert!(again.is_final);
    }

    #[test]
    fn test_compute_subscribed_free_tariff() {
        let free = Tariff {
            tariff_type: TariffType::Free,
            ..Default::default()
        };
        let session = ValetSession {
            created_at: Utc::now() - Duration::days(3),
            has_subscription: true,
            status: SessionStatus::Parked,
            ..Default::default()
        };

        let calc = TestCostService::compute(&free, &session, false);
        assert_eq!(calc.total_cost, dec!(0));
    }
}
