//! Integration tests for session API DTOs
//!
//! These tests exercise the wire shapes the handlers accept and emit.
//! For full integration testing, set DATABASE_URL environment variable.

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use valet_api::dto::session::{
        PaymentRequest, SessionCreateRequest, SessionFilterParams, SessionResponse,
        SessionUpdateRequest,
    };
    use valet_api::dto::tariff::{CalculationResponse, TariffCreateRequest, TariffResponse};
    use valet_api::dto::PaginationParams;
    use valet_core::models::{
        PaymentStatus, SessionStatus, Tariff, TariffType, ValetSession,
    };
    use validator::Validate;

    #[test]
    fn test_session_create_request_from_json() {
        let body = serde_json::json!({
            "car_number": "A123BC",
            "client_name": "Ivan Petrov",
            "client_card_number": "C-1044",
            "has_subscription": true,
            "car_photos": ["/uploads/a.jpg", "/uploads/b.jpg"]
        });

        let req: SessionCreateRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_ok());

        let input = req.to_input();
        assert_eq!(input.car_number, "A123BC");
        assert!(input.has_subscription);
        assert_eq!(
            input.car_photos_urls.as_deref(),
            Some("/uploads/a.jpg,/uploads/b.jpg")
        );
    }

    #[test]
    fn test_session_update_request_carries_status() {
        let body = serde_json::json!({
            "status": "parked",
            "parking_spot": "B-12",
            "parking_photos": ["/uploads/spot.jpg"]
        });

        let req: SessionUpdateRequest = serde_json::from_value(body).unwrap();
        let patch = req.to_patch();
        assert_eq!(patch.status, Some(SessionStatus::Parked));
        assert_eq!(patch.parking_spot.as_deref(), Some("B-12"));
        assert_eq!(patch.parking_photos_urls.as_deref(), Some("/uploads/spot.jpg"));
        assert!(patch.car_model.is_none());
    }

    #[test]
    fn test_session_response_shape() {
        let session = ValetSession {
            id: 7,
            car_number: "A123BC".to_string(),
            session_number: Some("104217".to_string()),
            status: SessionStatus::Parked,
            calculated_cost: Some(dec!(500)),
            paid_amount: dec!(200),
            payment_status: PaymentStatus::Partial,
            car_photos_urls: Some("/u/a.jpg,/u/b.jpg".to_string()),
            created_at: Utc::now() - Duration::hours(2),
            ..Default::default()
        };

        let resp = SessionResponse::from(session);
        assert_eq!(resp.outstanding_balance, dec!(300));
        assert_eq!(resp.car_photos.len(), 2);

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "parked");
        assert_eq!(value["payment_status"], "partial");
        assert_eq!(value["session_number"], "104217");
    }

    #[test]
    fn test_payment_request_validation() {
        let body = serde_json::json!({
            "amount": "200.00",
            "payment_method": "card"
        });
        let req: PaymentRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.to_input().amount, Some(dec!(200.00)));

        let bad = serde_json::json!({ "payment_method": "" });
        let req: PaymentRequest = serde_json::from_value(bad).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_filter_params_status_parsing() {
        let params = SessionFilterParams {
            search: Some("A123".to_string()),
            status: Some("return_requested".to_string()),
        };
        assert_eq!(
            params.parsed_status().unwrap(),
            Some(SessionStatus::ReturnRequested)
        );

        let invalid = SessionFilterParams {
            search: None,
            status: Some("impounded".to_string()),
        };
        assert!(invalid.parsed_status().is_err());
    }

    #[test]
    fn test_pagination_offset_calculation() {
        let params = PaginationParams {
            page: 1,
            per_page: 10,
        };
        assert_eq!(params.offset(), 0);

        let params = PaginationParams {
            page: 3,
            per_page: 20,
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_tariff_create_request_defaults() {
        let body = serde_json::json!({
            "name": "Guest Standard",
            "tariff_type": "hourly",
            "price_per_hour": "100"
        });

        let req: TariffCreateRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_ok());

        let tariff = req.to_tariff();
        assert_eq!(tariff.tariff_type, TariffType::Hourly);
        assert_eq!(tariff.minimum_hours, 1);
        assert!(tariff.is_active);
        assert!(!tariff.is_default_for_guests);
    }

    #[test]
    fn test_tariff_response_conversion() {
        let tariff = Tariff {
            id: 9,
            name: "Guest Standard".to_string(),
            tariff_type: TariffType::Hourly,
            price_per_hour: dec!(100),
            free_minutes: 15,
            is_default_for_guests: true,
            ..Default::default()
        };

        let resp = TariffResponse::from(tariff);
        assert_eq!(resp.id, 9);
        assert!(resp.is_default_for_guests);

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["tariff_type"], "hourly");
    }

    #[test]
    fn test_calculation_response_carries_breakdown() {
        let tariff = Tariff {
            id: 3,
            name: "Daily".to_string(),
            tariff_type: TariffType::Daily,
            price_per_day: dec!(1000),
            ..Default::default()
        };

        let calc = tariff.calculate_cost(Duration::hours(25), false, false);
        let resp = CalculationResponse::from_calculation(3, &calc);

        assert_eq!(resp.tariff_id, 3);
        assert_eq!(resp.total_cost, dec!(2000));
        assert_eq!(resp.breakdown["days"], 2);
    }
}
