//! Valet session DTOs
//!
//! Photo groups cross the wire as URL arrays; storage keeps them as one
//! comma-joined column per group, so the DTO layer converts in both
//! directions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use valet_core::models::{
    photos_from_urls, photos_to_urls, PaymentStatus, PhotoData, SessionStatus, ValetSession,
};
use valet_core::traits::SessionPatch;
use valet_core::AppError;
use valet_services::{CreateSessionInput, PaymentInput};
use validator::Validate;

fn join_photo_urls(urls: &Option<Vec<String>>) -> Option<String> {
    urls.as_ref().and_then(|list| {
        let photos: Vec<PhotoData> = list
            .iter()
            .enumerate()
            .map(|(i, url)| PhotoData {
                id: (i + 1).to_string(),
                url: url.clone(),
                filename: None,
            })
            .collect();
        photos_to_urls(&photos)
    })
}

/// Request body for creating a valet session
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SessionCreateRequest {
    pub employee_id: Option<i32>,

    #[validate(length(min = 1, max = 20))]
    pub car_number: String,

    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_card_number: Option<String>,
    pub parking_spot: Option<String>,
    pub parking_card: Option<String>,

    #[serde(default)]
    pub has_subscription: bool,

    pub notes: Option<String>,
    pub tariff_id: Option<i32>,

    /// Photo URLs taken at car acceptance
    pub car_photos: Option<Vec<String>>,
}

impl SessionCreateRequest {
    /// Convert into the service-layer input
    pub fn to_input(&self) -> CreateSessionInput {
        CreateSessionInput {
            employee_id: self.employee_id,
            car_number: self.car_number.trim().to_string(),
            car_model: self.car_model.clone(),
            car_color: self.car_color.clone(),
            client_name: self.client_name.clone(),
            client_phone: self.client_phone.clone(),
            client_card_number: self.client_card_number.clone(),
            parking_spot: self.parking_spot.clone(),
            parking_card: self.parking_card.clone(),
            has_subscription: self.has_subscription,
            notes: self.notes.clone(),
            tariff_id: self.tariff_id,
            car_photos_urls: join_photo_urls(&self.car_photos),
        }
    }
}

/// Request body for updating a valet session; omitted fields are untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SessionUpdateRequest {
    /// Requested status; validated against the transition table
    pub status: Option<SessionStatus>,

    pub employee_id: Option<i32>,
    pub request_accepted_by_id: Option<i32>,
    pub car_model: Option<String>,
    pub car_color: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_card_number: Option<String>,
    pub parking_spot: Option<String>,
    pub parking_card: Option<String>,
    pub has_subscription: Option<bool>,
    pub notes: Option<String>,

    pub car_photos: Option<Vec<String>>,
    pub parking_photos: Option<Vec<String>>,
    pub return_start_photos: Option<Vec<String>>,
    pub return_delivery_photos: Option<Vec<String>>,
}

impl SessionUpdateRequest {
    /// Convert into the repository patch
    pub fn to_patch(&self) -> SessionPatch {
        SessionPatch {
            employee_id: self.employee_id,
            request_accepted_by_id: self.request_accepted_by_id,
            car_model: self.car_model.clone(),
            car_color: self.car_color.clone(),
            client_name: self.client_name.clone(),
            client_phone: self.client_phone.clone(),
            client_card_number: self.client_card_number.clone(),
            parking_spot: self.parking_spot.clone(),
            parking_card: self.parking_card.clone(),
            has_subscription: self.has_subscription,
            notes: self.notes.clone(),
            status: self.status,
            car_photos_urls: join_photo_urls(&self.car_photos),
            parking_photos_urls: join_photo_urls(&self.parking_photos),
            return_start_photos_urls: join_photo_urls(&self.return_start_photos),
            return_delivery_photos_urls: join_photo_urls(&self.return_delivery_photos),
        }
    }
}

/// Query parameters for session listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFilterParams {
    /// Free-text search over car number, client name, card and session number
    pub search: Option<String>,

    /// Exact status filter
    pub status: Option<String>,
}

impl SessionFilterParams {
    /// Parse the status filter, rejecting unknown values
    pub fn parsed_status(&self) -> Result<Option<SessionStatus>, AppError> {
        match self.status.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => SessionStatus::from_str(s)
                .map(Some)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown status: {}", s))),
        }
    }
}

/// Request body for assigning a tariff to a session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTariffRequest {
    pub tariff_id: i32,
}

/// Request body for recording a payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Amount received; defaults to the outstanding balance
    pub amount: Option<Decimal>,

    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,

    pub payment_reference: Option<String>,
    pub employee_id: Option<i32>,
}

impl PaymentRequest {
    /// Convert into the service-layer input
    pub fn to_input(&self) -> PaymentInput {
        PaymentInput {
            amount: self.amount,
            payment_method: self.payment_method.clone(),
            payment_reference: self.payment_reference.clone(),
            employee_id: self.employee_id,
        }
    }
}

/// Valet session response body
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: i32,
    pub session_number: Option<String>,
    pub status: SessionStatus,
    pub employee_id: Option<i32>,
    pub request_accepted_by_id: Option<i32>,
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
    pub car_photos: Vec<PhotoData>,
    pub parking_photos: Vec<PhotoData>,
    pub return_start_photos: Vec<PhotoData>,
    pub return_delivery_photos: Vec<PhotoData>,
    pub calculated_cost: Option<Decimal>,
    pub cost_calculation_details: Option<JsonValue>,
    pub cost_calculated_at: Option<DateTime<Utc>>,
    pub is_cost_final: bool,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub paid_amount: Decimal,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub outstanding_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ValetSession> for SessionResponse {
    fn from(s: ValetSession) -> Self {
        let outstanding_balance = s.outstanding_balance();
        Self {
            id: s.id,
            session_number: s.session_number,
            status: s.status,
            employee_id: s.employee_id,
            request_accepted_by_id: s.request_accepted_by_id,
            car_number: s.car_number,
            car_model: s.car_model,
            car_color: s.car_color,
            client_name: s.client_name,
            client_phone: s.client_phone,
            client_card_number: s.client_card_number,
            parking_spot: s.parking_spot,
            parking_card: s.parking_card,
            has_subscription: s.has_subscription,
            notes: s.notes,
            tariff_id: s.tariff_id,
            car_photos: photos_from_urls(s.car_photos_urls.as_deref()),
            parking_photos: photos_from_urls(s.parking_photos_urls.as_deref()),
            return_start_photos: photos_from_urls(s.return_start_photos_urls.as_deref()),
            return_delivery_photos: photos_from_urls(s.return_delivery_photos_urls.as_deref()),
            calculated_cost: s.calculated_cost,
            cost_calculation_details: s.cost_calculation_details,
            cost_calculated_at: s.cost_calculated_at,
            is_cost_final: s.is_cost_final,
            payment_status: s.payment_status,
            payment_method: s.payment_method,
            paid_amount: s.paid_amount,
            payment_date: s.payment_date,
            payment_reference: s.payment_reference,
            outstanding_balance,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Response for the card availability check
#[derive(Debug, Clone, Serialize)]
pub struct CardCheckResponse {
    pub card_number: String,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let valid = SessionCreateRequest {
            car_number: "A123BC".to_string(),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let invalid = SessionCreateRequest {
            car_number: String::new(),
            ..Default::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_photo_urls_join() {
        let urls = Some(vec!["/u/a.jpg".to_string(), "/u/b.jpg".to_string()]);
        assert_eq!(join_photo_urls(&urls).as_deref(), Some("/u/a.jpg,/u/b.jpg"));
        assert!(join_photo_urls(&None).is_none());
        assert!(join_photo_urls(&Some(Vec::new())).is_none());
    }

    #[test]
    fn test_filter_status_parse() {
        let params = SessionFilterParams {
            search: None,
            status: Some("parked".to_string()),
        };
        assert_eq!(params.parsed_status().unwrap(), Some(SessionStatus::Parked));

        let bad = SessionFilterParams {
            search: None,
            status: Some("towed".to_string()),
        };
        assert!(bad.parsed_status().is_err());
    }

    #[test]
    fn test_session_response_reconstructs_photos() {
        let session = ValetSession {
            car_number: "A123BC".to_string(),
            car_photos_urls: Some("/u/a.jpg,/u/b.jpg".to_string()),
            ..Default::default()
        };
        let resp = SessionResponse::from(session);
        assert_eq!(resp.car_photos.len(), 2);
        assert_eq!(resp.car_photos[0].id, "1");
        assert!(resp.parking_photos.is_empty());
    }
}
