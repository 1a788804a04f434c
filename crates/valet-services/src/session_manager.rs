//! Session lifecycle manager
//!
//! Orchestrates a valet session from creation to completion:
//! - Create sessions with duplicate-card protection and tariff auto-assignment
//! - Validate status transitions against the transition table
//! - Run the payment gate before a car return is granted
//! - Record payments against the calculated cost
//! - Append an audit log entry for every lifecycle event

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use valet_core::{
    config::ValetConfig,
    models::{
        PaymentStatus, SessionAction, SessionLogEntry, SessionLogView, SessionStatus, Tariff,
        ValetSession,
    },
    traits::{
        Repository, SessionLogRepository, SessionPatch, SessionRepository,
        TariffRepository,
    },
    AppError, AppResult,
};

use crate::constants::SESSION_NUMBER_MAX_ATTEMPTS;
use crate::cost::{CostQuote, CostService};
use crate::tariff_admin;

/// Input for creating a valet session
#[derive(Debug, Clone, Default)]
pub struct CreateSessionInput {
    pub employee_id: Option<i32>,
    pub car_number: String,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_card_number: Option<String>,
    pub parking_spot: Option<String>,
    pub parking_card: Option<String>,
    pub has_subscription: bool,
    pub notes: Option<String>,
    pub tariff_id: Option<i32>,
    pub car_photos_urls: Option<String>,
}

/// Input for recording a payment
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Amount received; defaults to the outstanding balance
    pub amount: Option<Decimal>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub employee_id: Option<i32>,
}

/// Receipt returned after a recorded payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub session_id: i32,
    pub amount_received: Decimal,
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub payment_status: PaymentStatus,
}

/// Outcome of a car return request
///
/// A refused return is not an error: the client simply has to pay first.
/// Both arms serialize to a 200 response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReturnRequestOutcome {
    /// The return was granted and the session moved to `return_requested`
    Granted { session: ValetSession },
    /// Payment is owed before the car can be returned
    PaymentRequired {
        session_id: i32,
        session_number: Option<String>,
        cost: Decimal,
        paid_amount: Decimal,
        remaining: Decimal,
        calculation: Option<JsonValue>,
    },
}

/// Session lifecycle manager
pub struct SessionManager<S: SessionRepository, T: TariffRepository, L: SessionLogRepository> {
    session_repo: Arc<S>,
    tariff_repo: Arc<T>,
    log_repo: Arc<L>,
    cost: CostService<S, T>,
    config: ValetConfig,
}

impl<S, T, L> SessionManager<S, T, L>
where
    S: SessionRepository,
    T: TariffRepository,
    L: SessionLogRepository,
{
    /// Create a new session manager
    pub fn new(
        session_repo: Arc<S>,
        tariff_repo: Arc<T>,
        log_repo: Arc<L>,
        config: ValetConfig,
    ) -> Self {
        let cost = CostService::new(Arc::clone(&session_repo), Arc::clone(&tariff_repo));
        Self {
            session_repo,
            tariff_repo,
            log_repo,
            cost,
            config,
        }
    }

    /// Append a log entry, best effort
    ///
    /// The audit trail is secondary to the primary write: a failed append is
    /// logged as a warning and never rolls the operation back.
    async fn append_log(
        &self,
        session_id: i32,
        employee_id: Option<i32>,
        action: SessionAction,
        details: Option<String>,
    ) {
        let entry = SessionLogEntry::new(session_id, employee_id, action, details);
        if let Err(e) = self.log_repo.append(&entry).await {
            warn!(
                "Failed to append {} log for session {}: {}",
                action, session_id, e
            );
        }
    }

    /// Candidate session number for an attempt
    ///
    /// Digits are derived from the clock's microseconds, perturbed per
    /// attempt; uniqueness is enforced by checking the store and retrying.
    fn session_number_candidate(&self, attempt: u32) -> String {
        let micros = Utc::now().timestamp_micros().unsigned_abs();
        let length = self.config.session_number_length.min(12);
        let space = 10u64.pow(length as u32);
        let candidate = (micros.wrapping_add(u64::from(attempt) * 7919)) % space;
        format!("{:0width$}", candidate, width = length)
    }

    /// Generate a unique human-facing session number
    async fn generate_session_number(&self) -> AppResult<String> {
        for attempt in 0..SESSION_NUMBER_MAX_ATTEMPTS {
            let candidate = self.session_number_candidate(attempt);
            if !self.session_repo.session_number_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!("Session number {} taken, retrying", candidate);
        }

        Err(AppError::Internal(
            "Could not generate a unique session number".to_string(),
        ))
    }

    /// Create a new valet session
    ///
    /// Rejects the creation when the client card is already attached to an
    /// active session. When no tariff is given, one is auto-assigned from
    /// the defaults for the client type. The minimum charge for the tariff
    /// is seeded as the initial calculated cost.
    #[instrument(skip(self, input), fields(car_number = %input.car_number))]
    pub async fn create_session(&self, input: CreateSessionInput) -> AppResult<ValetSession> {
        if let Some(card) = input
            .client_card_number
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            if let Some(existing) = self.session_repo.find_active_by_card(card).await? {
                warn!(
                    "Card {} already in use by session {} (car {})",
                    card, existing.id, existing.car_number
                );
                return Err(AppError::DuplicateActiveCard {
                    card: card.to_string(),
                    car: existing.car_number,
                });
            }
        }

        let tariff = match input.tariff_id {
            Some(id) => self
                .tariff_repo
                .find_by_id(id)
                .await?
                .filter(|t| t.is_active)
                .ok_or_else(|| AppError::TariffNotFound(id.to_string()))?,
            None => {
                tariff_admin::auto_tariff(
                    self.tariff_repo.as_ref(),
                    &self.config,
                    input.has_subscription,
                )
                .await?
            }
        };

        let session_number = self.generate_session_number().await?;
        let minimum_charge = tariff.minimum_charge();

        let seed_details = json!({
            "tariff_type": tariff.tariff_type,
            "tariff_name": tariff.name,
            "reason": "Minimum charge at session start",
            "total_cost": minimum_charge,
        });

        let session = ValetSession {
            employee_id: input.employee_id,
            car_number: input.car_number,
            car_model: input.car_model,
            car_color: input.car_color,
            client_name: input.client_name,
            client_phone: input.client_phone,
            client_card_number: input.client_card_number,
            parking_spot: input.parking_spot,
            parking_card: input.parking_card,
            has_subscription: input.has_subscription,
            notes: input.notes,
            status: SessionStatus::Created,
            session_number: Some(session_number),
            tariff_id: Some(tariff.id),
            car_photos_urls: input.car_photos_urls,
            calculated_cost: Some(minimum_charge),
            cost_calculation_details: Some(seed_details),
            cost_calculated_at: Some(Utc::now()),
            ..Default::default()
        };

        let created = self.session_repo.create(&session).await?;

        info!(
            "Created session {} ({:?}) for car {}",
            created.id, created.session_number, created.car_number
        );

        let client_kind = if created.has_subscription {
            "Resident"
        } else {
            "Guest"
        };
        self.append_log(
            created.id,
            created.employee_id,
            SessionAction::Created,
            Some(format!("{} client, tariff: {}", client_kind, tariff.name)),
        )
        .await;

        Ok(created)
    }

    /// Fetch a session by id
    pub async fn get_session(&self, id: i32) -> AppResult<ValetSession> {
        self.session_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Update a session, validating any requested status transition
    ///
    /// Status side effects:
    /// - entering `parked` recomputes and persists the live cost for
    ///   chargeable tariffs;
    /// - entering `completed` or `cancelled` freezes the cost;
    /// - every status change appends a log entry.
    ///
    /// Reassigning the client card runs the same duplicate-card guard as
    /// session creation.
    #[instrument(skip(self, patch))]
    pub async fn update_session(&self, id: i32, mut patch: SessionPatch) -> AppResult<ValetSession> {
        let session = self.get_session(id).await?;

        if let Some(card) = patch
            .client_card_number
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            if session.client_card_number.as_deref() != Some(card) {
                if let Some(existing) = self.session_repo.find_active_by_card(card).await? {
                    if existing.id != id {
                        warn!(
                            "Card {} already in use by session {} (car {})",
                            card, existing.id, existing.car_number
                        );
                        return Err(AppError::DuplicateActiveCard {
                            card: card.to_string(),
                            car: existing.car_number,
                        });
                    }
                }
            }
        }

        let status_change = match patch.status {
            Some(next) if next != session.status => {
                if !session.status.can_transition_to(next) {
                    return Err(AppError::InvalidTransition {
                        from: session.status.to_string(),
                        to: next.to_string(),
                    });
                }
                Some(next)
            }
            _ => {
                patch.status = None;
                None
            }
        };

        let updated = self.session_repo.apply_patch(id, &patch).await?;

        let Some(next) = status_change else {
            return Ok(updated);
        };

        info!("Session {} moved {} -> {}", id, session.status, next);

        let actor = patch
            .employee_id
            .or(patch.request_accepted_by_id)
            .or(updated.employee_id);
        self.append_log(id, actor, SessionAction::for_status(next), None)
            .await;

        match next {
            SessionStatus::Parked => {
                if !updated.has_subscription && self.is_chargeable(&updated).await {
                    if let Some(quote) = self.cost.refresh_quietly(&updated).await {
                        if quote.cost > Decimal::ZERO {
                            self.append_log(
                                id,
                                actor,
                                SessionAction::CostCalculated,
                                Some(format!("Parking cost: {}", quote.cost)),
                            )
                            .await;
                        }
                    }
                }
                Ok(updated)
            }
            SessionStatus::Completed | SessionStatus::Cancelled => {
                let finalized = self.cost.finalize(&updated).await?;
                self.append_log(
                    id,
                    actor,
                    SessionAction::CostCalculated,
                    finalized
                        .calculated_cost
                        .map(|c| format!("Final cost: {}", c)),
                )
                .await;
                Ok(finalized)
            }
            _ => Ok(updated),
        }
    }

    /// Whether the session's tariff ever produces a charge for this client
    async fn is_chargeable(&self, session: &ValetSession) -> bool {
        let Some(tariff_id) = session.tariff_id else {
            return false;
        };
        match self.tariff_repo.find_by_id(tariff_id).await {
            Ok(Some(tariff)) => tariff.tariff_type.is_chargeable(),
            Ok(None) => false,
            Err(e) => {
                warn!("Tariff lookup for session {} failed: {}", session.id, e);
                false
            }
        }
    }

    /// Current cost quote for a session
    ///
    /// Live while the session is open, frozen once finalized.
    #[instrument(skip(self))]
    pub async fn get_session_cost(&self, id: i32) -> AppResult<CostQuote> {
        let session = self.get_session(id).await?;
        self.cost.quote(&session).await
    }

    /// Reassign the tariff of a session and recompute its cost
    #[instrument(skip(self))]
    pub async fn update_session_tariff(&self, id: i32, tariff_id: i32) -> AppResult<ValetSession> {
        let session = self.get_session(id).await?;

        if session.is_cost_final {
            return Err(AppError::CostAlreadyFinal);
        }

        let tariff = self
            .tariff_repo
            .find_by_id(tariff_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::TariffNotFound(tariff_id.to_string()))?;

        let updated = self.session_repo.set_tariff(id, tariff.id).await?;

        info!("Session {} moved to tariff {} ({})", id, tariff.id, tariff.name);

        // Recompute under the new tariff so the cached cost never reflects
        // the old pricing.
        self.cost.refresh_quietly(&updated).await;

        self.get_session(id).await
    }

    /// Freeze the cost of an ended session
    ///
    /// Idempotent; a second call returns the frozen session unchanged.
    #[instrument(skip(self))]
    pub async fn finalize_session_cost(&self, id: i32) -> AppResult<ValetSession> {
        let session = self.get_session(id).await?;
        let was_final = session.is_cost_final;

        let finalized = self.cost.finalize(&session).await?;

        if !was_final {
            self.append_log(
                id,
                session.employee_id,
                SessionAction::CostCalculated,
                finalized
                    .calculated_cost
                    .map(|c| format!("Final cost: {}", c)),
            )
            .await;
        }

        Ok(finalized)
    }

    /// Request the car back for a client card
    ///
    /// The payment gate runs first: with an outstanding balance the state
    /// does not change and a `PaymentRequired` outcome is returned. With a
    /// settled (or zero) balance the session moves to `return_requested`.
    #[instrument(skip(self))]
    pub async fn request_return(&self, card_number: &str) -> AppResult<ReturnRequestOutcome> {
        let session = self
            .session_repo
            .find_parked_by_card(card_number)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No parked session for card {}", card_number))
            })?;

        let quote = self.cost.quote(&session).await?;
        let remaining = (quote.cost - session.paid_amount).max(Decimal::ZERO);

        if remaining > Decimal::ZERO && session.payment_status != PaymentStatus::Paid {
            info!(
                "Return refused for session {}: {} outstanding",
                session.id, remaining
            );
            return Ok(ReturnRequestOutcome::PaymentRequired {
                session_id: session.id,
                session_number: session.session_number,
                cost: quote.cost,
                paid_amount: session.paid_amount,
                remaining,
                calculation: quote.calculation,
            });
        }

        let updated = self
            .session_repo
            .apply_patch(
                session.id,
                &SessionPatch {
                    status: Some(SessionStatus::ReturnRequested),
                    ..Default::default()
                },
            )
            .await?;

        info!("Return granted for session {}", updated.id);

        self.append_log(updated.id, None, SessionAction::ReturnRequested, None)
            .await;

        Ok(ReturnRequestOutcome::Granted { session: updated })
    }

    /// Record a payment against a session
    ///
    /// The amount defaults to the outstanding balance. Overpayment is
    /// rejected; the payment status is derived from the running total. The
    /// whole read-modify-write runs under a row lock in the repository.
    #[instrument(skip(self, input))]
    pub async fn process_payment(
        &self,
        id: i32,
        input: PaymentInput,
    ) -> AppResult<PaymentReceipt> {
        if input.amount.is_some_and(|a| a <= Decimal::ZERO) {
            return Err(AppError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        let outcome = self
            .session_repo
            .add_payment(
                id,
                input.amount,
                &input.payment_method,
                input.payment_reference.as_deref(),
            )
            .await?;
        let updated = outcome.session;
        let amount = outcome.amount_received;

        info!(
            "Payment of {} recorded for session {} (total paid {})",
            amount, id, updated.paid_amount
        );

        let mut details = format!("Amount {} via {}", amount, input.payment_method);
        if let Some(reference) = &input.payment_reference {
            details.push_str(&format!(" (ref {})", reference));
        }
        self.append_log(
            id,
            input.employee_id,
            SessionAction::PaymentReceived,
            Some(details),
        )
        .await;

        Ok(PaymentReceipt {
            session_id: updated.id,
            amount_received: amount,
            total_paid: updated.paid_amount,
            remaining: updated.outstanding_balance(),
            payment_status: updated.payment_status,
        })
    }

    /// Audit log for a session, newest first
    #[instrument(skip(self))]
    pub async fn session_logs(&self, id: i32) -> AppResult<Vec<SessionLogView>> {
        // Surface a 404 for unknown sessions rather than an empty list.
        self.get_session(id).await?;
        self.log_repo.list_for_session(id).await
    }

    /// The active session for a client card, if any
    pub async fn find_by_card(&self, card_number: &str) -> AppResult<Option<ValetSession>> {
        self.session_repo.find_active_by_card(card_number).await
    }

    /// Whether a client card is free to start a new session
    pub async fn check_card(&self, card_number: &str) -> AppResult<bool> {
        Ok(self
            .session_repo
            .find_active_by_card(card_number)
            .await?
            .is_none())
    }

    /// List sessions with optional search text and status filter
    pub async fn list_sessions(
        &self,
        search: Option<&str>,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ValetSession>, i64)> {
        self.session_repo
            .list_filtered(search, status, limit, offset)
            .await
    }

    /// All sessions still in progress
    pub async fn list_active(&self, limit: i64) -> AppResult<Vec<ValetSession>> {
        self.session_repo.list_active(limit).await
    }

    /// Sessions assigned to an employee
    pub async fn list_by_employee(
        &self,
        employee_id: i32,
        status: Option<SessionStatus>,
    ) -> AppResult<Vec<ValetSession>> {
        self.session_repo.list_by_employee(employee_id, status).await
    }

    /// Delete a session
    pub async fn delete_session(&self, id: i32) -> AppResult<()> {
        if !self.session_repo.delete(id).await? {
            return Err(AppError::SessionNotFound(id.to_string()));
        }
        info!("Deleted session {}", id);
        Ok(())
    }

    /// The tariff currently assigned to a session
    pub async fn session_tariff(&self, id: i32) -> AppResult<Option<Tariff>> {
        let session = self.get_session(id).await?;
        match session.tariff_id {
            Some(tariff_id) => self.tariff_repo.find_by_id(tariff_id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryLogs, MemorySessions, MemoryTariffs};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn manager(
        sessions: Arc<MemorySessions>,
        tariffs: Arc<MemoryTariffs>,
    ) -> SessionManager<MemorySessions, MemoryTariffs, MemoryLogs> {
        SessionManager::new(
            sessions,
            tariffs,
            Arc::new(MemoryLogs::default()),
            ValetConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_cancelling_freezes_cost() {
        let start = Utc::now() - Duration::hours(2);
        let sessions = Arc::new(MemorySessions::with(vec![ValetSession {
            id: 1,
            status: SessionStatus::Parked,
            tariff_id: Some(1),
            calculated_cost: Some(dec!(100)),
            created_at: start,
            updated_at: start,
            ..Default::default()
        }]));
        let tariffs = Arc::new(MemoryTariffs::with(vec![Tariff {
            id: 1,
            price_per_hour: dec!(100),
            ..Default::default()
        }]));
        let mgr = manager(Arc::clone(&sessions), tariffs);

        let updated = mgr
            .update_session(
                1,
                SessionPatch {
                    status: Some(SessionStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, SessionStatus::Cancelled);
        assert!(updated.is_cost_final);
        assert_eq!(updated.calculated_cost, Some(dec!(200)));
        assert!(sessions.get(1).unwrap().is_cost_final);
    }

    #[tokio::test]
    async fn test_update_rejects_card_already_in_use() {
        let sessions = Arc::new(MemorySessions::with(vec![
            ValetSession {
                id: 1,
                car_number: "A123BC".to_string(),
                client_card_number: Some("C-100".to_string()),
                status: SessionStatus::Parked,
                ..Default::default()
            },
            ValetSession {
                id: 2,
                car_number: "B456DE".to_string(),
                status: SessionStatus::Created,
                ..Default::default()
            },
        ]));
        let mgr = manager(Arc::clone(&sessions), Arc::new(MemoryTariffs::default()));

        let err = mgr
            .update_session(
                2,
                SessionPatch {
                    client_card_number: Some("C-100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateActiveCard { .. }));

        // Re-sending a session's own card is not a conflict
        let ok = mgr
            .update_session(
                1,
                SessionPatch {
                    client_card_number: Some("C-100".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(ok.is_ok());
    }

    #[test]
    fn test_payment_receipt_serializes() {
        let receipt = PaymentReceipt {
            session_id: 7,
            amount_received: dec!(200),
            total_paid: dec!(200),
            remaining: dec!(300),
            payment_status: PaymentStatus::Partial,
        };

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["session_id"], 7);
        assert_eq!(value["payment_status"], "partial");
    }

    #[test]
    fn test_return_outcome_tagging() {
        let refused = ReturnRequestOutcome::PaymentRequired {
            session_id: 3,
            session_number: Some("104217".to_string()),
            cost: dec!(500),
            paid_amount: dec!(100),
            remaining: dec!(400),
            calculation: None,
        };

        let value = serde_json::to_value(&refused).unwrap();
        assert_eq!(value["outcome"], "payment_required");
        assert_eq!(value["remaining"], "400");
    }
}
