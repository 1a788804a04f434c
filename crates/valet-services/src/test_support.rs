//! In-memory repositories for service tests
//!
//! Back the repository traits with `Mutex<Vec<_>>` stores so the service
//! layer can be exercised without a database. Write semantics mirror the
//! Postgres implementations.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Mutex;
use valet_core::{
    models::{
        PaymentStatus, SessionLogEntry, SessionLogView, SessionStatus, Tariff, ValetSession,
    },
    traits::{
        CostUpdate, DefaultAudience, PaymentOutcome, Repository, SessionLogRepository,
        SessionPatch, SessionRepository, TariffRepository,
    },
    AppError, AppResult,
};

/// In-memory session store
#[derive(Default)]
pub struct MemorySessions {
    inner: Mutex<Vec<ValetSession>>,
}

impl MemorySessions {
    pub fn with(sessions: Vec<ValetSession>) -> Self {
        Self {
            inner: Mutex::new(sessions),
        }
    }

    pub fn get(&self, id: i32) -> Option<ValetSession> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    fn mutate<R>(
        &self,
        id: i32,
        f: impl FnOnce(&mut ValetSession) -> AppResult<R>,
    ) -> AppResult<R> {
        let mut sessions = self.inner.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        f(session)
    }
}

#[async_trait]
impl Repository<ValetSession, i32> for MemorySessions {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<ValetSession>> {
        Ok(self.get(id))
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<ValetSession>> {
        let sessions = self.inner.lock().unwrap();
        Ok(sessions
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.inner.lock().unwrap().len() as i64)
    }

    async fn create(&self, entity: &ValetSession) -> AppResult<ValetSession> {
        let mut sessions = self.inner.lock().unwrap();
        let mut created = entity.clone();
        created.id = sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        sessions.push(created.clone());
        Ok(created)
    }

    async fn update(&self, entity: &ValetSession) -> AppResult<ValetSession> {
        self.mutate(entity.id, |s| {
            *s = entity.clone();
            Ok(s.clone())
        })
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut sessions = self.inner.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        Ok(sessions.len() < before)
    }
}

#[async_trait]
impl SessionRepository for MemorySessions {
    async fn find_active_by_card(&self, card_number: &str) -> AppResult<Option<ValetSession>> {
        let sessions = self.inner.lock().unwrap();
        Ok(sessions
            .iter()
            .find(|s| {
                s.status.is_active() && s.client_card_number.as_deref() == Some(card_number)
            })
            .cloned())
    }

    async fn find_parked_by_card(&self, card_number: &str) -> AppResult<Option<ValetSession>> {
        let sessions = self.inner.lock().unwrap();
        Ok(sessions
            .iter()
            .find(|s| {
                s.status == SessionStatus::Parked
                    && s.client_card_number.as_deref() == Some(card_number)
            })
            .cloned())
    }

    async fn list_filtered(
        &self,
        search: Option<&str>,
        status: Option<SessionStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ValetSession>, i64)> {
        let sessions = self.inner.lock().unwrap();
        let matches: Vec<ValetSession> = sessions
            .iter()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .filter(|s| {
                search.map_or(true, |text| {
                    let text = text.to_lowercase();
                    s.car_number.to_lowercase().contains(&text)
                        || s.client_name
                            .as_deref()
                            .is_some_and(|n| n.to_lowercase().contains(&text))
                        || s.client_card_number.as_deref() == Some(text.as_str())
                        || s.session_number.as_deref() == Some(text.as_str())
                })
            })
            .cloned()
            .collect();
        let total = matches.len() as i64;
        Ok((
            matches
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect(),
            total,
        ))
    }

    async fn list_active(&self, limit: i64) -> AppResult<Vec<ValetSession>> {
        let sessions = self.inner.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|s| s.status.is_active())
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_by_employee(
        &self,
        employee_id: i32,
        status: Option<SessionStatus>,
    ) -> AppResult<Vec<ValetSession>> {
        let sessions = self.inner.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|s| {
                s.employee_id == Some(employee_id)
                    || s.request_accepted_by_id == Some(employee_id)
            })
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .cloned()
            .collect())
    }

    async fn apply_patch(&self, id: i32, patch: &SessionPatch) -> AppResult<ValetSession> {
        self.mutate(id, |s| {
            if let Some(v) = patch.employee_id {
                s.employee_id = Some(v);
            }
            if let Some(v) = patch.request_accepted_by_id {
                s.request_accepted_by_id = Some(v);
            }
            if let Some(v) = &patch.car_model {
                s.car_model = Some(v.clone());
            }
            if let Some(v) = &patch.car_color {
                s.car_color = Some(v.clone());
            }
            if let Some(v) = &patch.client_name {
                s.client_name = Some(v.clone());
            }
            if let Some(v) = &patch.client_phone {
                s.client_phone = Some(v.clone());
            }
            if let Some(v) = &patch.client_card_number {
                s.client_card_number = Some(v.clone());
            }
            if let Some(v) = &patch.parking_spot {
                s.parking_spot = Some(v.clone());
            }
            if let Some(v) = &patch.parking_card {
                s.parking_card = Some(v.clone());
            }
            if let Some(v) = patch.has_subscription {
                s.has_subscription = v;
            }
            if let Some(v) = &patch.notes {
                s.notes = Some(v.clone());
            }
            if let Some(v) = patch.status {
                s.status = v;
            }
            if let Some(v) = &patch.car_photos_urls {
                s.car_photos_urls = Some(v.clone());
            }
            if let Some(v) = &patch.parking_photos_urls {
                s.parking_photos_urls = Some(v.clone());
            }
            if let Some(v) = &patch.return_start_photos_urls {
                s.return_start_photos_urls = Some(v.clone());
            }
            if let Some(v) = &patch.return_delivery_photos_urls {
                s.return_delivery_photos_urls = Some(v.clone());
            }
            s.updated_at = Utc::now();
            Ok(s.clone())
        })
    }

    async fn save_cost(&self, id: i32, cost: &CostUpdate) -> AppResult<ValetSession> {
        self.mutate(id, |s| {
            s.calculated_cost = cost.calculated_cost;
            s.cost_calculation_details = cost.cost_calculation_details.clone();
            s.cost_calculated_at = cost.cost_calculated_at;
            s.is_cost_final = cost.is_cost_final;
            Ok(s.clone())
        })
    }

    async fn add_payment(
        &self,
        id: i32,
        amount: Option<Decimal>,
        payment_method: &str,
        payment_reference: Option<&str>,
    ) -> AppResult<PaymentOutcome> {
        self.mutate(id, |s| {
            let cost = s.calculated_cost.ok_or(AppError::NoCostToPay)?;
            let remaining = (cost - s.paid_amount).max(Decimal::ZERO);
            let amount = amount.unwrap_or(remaining);
            if amount <= Decimal::ZERO {
                return Err(AppError::Validation(
                    "Payment amount must be positive".to_string(),
                ));
            }
            if amount > remaining {
                return Err(AppError::OverpaymentAttempt {
                    remaining: remaining.to_string(),
                });
            }
            s.paid_amount += amount;
            s.payment_status = PaymentStatus::derive(s.paid_amount, cost);
            s.payment_method = Some(payment_method.to_string());
            s.payment_date = Some(Utc::now());
            s.payment_reference = payment_reference.map(str::to_string);
            s.updated_at = Utc::now();
            Ok(PaymentOutcome {
                session: s.clone(),
                amount_received: amount,
            })
        })
    }

    async fn set_tariff(&self, id: i32, tariff_id: i32) -> AppResult<ValetSession> {
        self.mutate(id, |s| {
            s.tariff_id = Some(tariff_id);
            s.updated_at = Utc::now();
            Ok(s.clone())
        })
    }

    async fn reset_costs_for_tariff(&self, tariff_id: i32) -> AppResult<i64> {
        let mut sessions = self.inner.lock().unwrap();
        let mut reset = 0;
        for s in sessions.iter_mut() {
            if s.tariff_id == Some(tariff_id)
                && !s.is_cost_final
                && !s.status.is_terminal()
                && s.calculated_cost.is_some()
            {
                s.calculated_cost = None;
                s.cost_calculation_details = None;
                s.cost_calculated_at = None;
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn session_number_exists(&self, session_number: &str) -> AppResult<bool> {
        let sessions = self.inner.lock().unwrap();
        Ok(sessions
            .iter()
            .any(|s| s.session_number.as_deref() == Some(session_number)))
    }
}

/// In-memory tariff store
#[derive(Default)]
pub struct MemoryTariffs {
    inner: Mutex<Vec<Tariff>>,
}

impl MemoryTariffs {
    pub fn with(tariffs: Vec<Tariff>) -> Self {
        Self {
            inner: Mutex::new(tariffs),
        }
    }

    pub fn set_price_per_hour(&self, id: i32, price: Decimal) {
        let mut tariffs = self.inner.lock().unwrap();
        if let Some(t) = tariffs.iter_mut().find(|t| t.id == id) {
            t.price_per_hour = price;
            t.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl Repository<Tariff, i32> for MemoryTariffs {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Tariff>> {
        let tariffs = self.inner.lock().unwrap();
        Ok(tariffs.iter().find(|t| t.id == id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        let tariffs = self.inner.lock().unwrap();
        Ok(tariffs
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.inner.lock().unwrap().len() as i64)
    }

    async fn create(&self, entity: &Tariff) -> AppResult<Tariff> {
        let mut tariffs = self.inner.lock().unwrap();
        let mut created = entity.clone();
        created.id = tariffs.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        tariffs.push(created.clone());
        Ok(created)
    }

    async fn update(&self, entity: &Tariff) -> AppResult<Tariff> {
        let mut tariffs = self.inner.lock().unwrap();
        let tariff = tariffs
            .iter_mut()
            .find(|t| t.id == entity.id)
            .ok_or_else(|| AppError::TariffNotFound(entity.id.to_string()))?;
        *tariff = entity.clone();
        Ok(tariff.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut tariffs = self.inner.lock().unwrap();
        let before = tariffs.len();
        tariffs.retain(|t| t.id != id);
        Ok(tariffs.len() < before)
    }
}

#[async_trait]
impl TariffRepository for MemoryTariffs {
    async fn find_active(&self, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        let tariffs = self.inner.lock().unwrap();
        Ok(tariffs
            .iter()
            .filter(|t| t.is_active)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_type(&self, tariff_type: &str) -> AppResult<Vec<Tariff>> {
        let tariffs = self.inner.lock().unwrap();
        Ok(tariffs
            .iter()
            .filter(|t| t.is_active && t.tariff_type.to_string() == tariff_type)
            .cloned()
            .collect())
    }

    async fn find_default(&self, audience: DefaultAudience) -> AppResult<Option<Tariff>> {
        let tariffs = self.inner.lock().unwrap();
        Ok(tariffs
            .iter()
            .find(|t| {
                t.is_active
                    && match audience {
                        DefaultAudience::Residents => t.is_default_for_residents,
                        DefaultAudience::Guests => t.is_default_for_guests,
                    }
            })
            .cloned())
    }

    async fn set_default(&self, id: i32, audience: DefaultAudience) -> AppResult<Tariff> {
        let mut tariffs = self.inner.lock().unwrap();
        for t in tariffs.iter_mut() {
            match audience {
                DefaultAudience::Residents => t.is_default_for_residents = t.id == id,
                DefaultAudience::Guests => t.is_default_for_guests = t.id == id,
            }
        }
        tariffs
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AppError::TariffNotFound(id.to_string()))
    }
}

/// In-memory append-only log store
#[derive(Default)]
pub struct MemoryLogs {
    inner: Mutex<Vec<SessionLogEntry>>,
}

impl MemoryLogs {
    pub fn entries(&self, session_id: i32) -> Vec<SessionLogEntry> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionLogRepository for MemoryLogs {
    async fn append(&self, entry: &SessionLogEntry) -> AppResult<SessionLogEntry> {
        let mut entries = self.inner.lock().unwrap();
        let mut appended = entry.clone();
        appended.id = entries.len() as i64 + 1;
        entries.push(appended.clone());
        Ok(appended)
    }

    async fn list_for_session(&self, session_id: i32) -> AppResult<Vec<SessionLogView>> {
        let entries = self.inner.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.session_id == session_id)
            .map(|e| SessionLogView {
                id: e.id,
                action: e.action,
                description: e.description.clone(),
                employee_name: "System".to_string(),
                timestamp: e.created_at,
                details: e.details.clone(),
            })
            .collect())
    }
}
