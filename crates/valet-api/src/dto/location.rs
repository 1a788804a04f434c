//! Location DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use valet_core::models::{Location, ParkingLot};

/// Location response body
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationResponse {
    fn from(l: Location) -> Self {
        Self {
            id: l.id,
            name: l.name,
            address: l.address,
            latitude: l.latitude,
            longitude: l.longitude,
            description: l.description,
            is_active: l.is_active,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// Parking lot response body
#[derive(Debug, Clone, Serialize)]
pub struct ParkingLotResponse {
    pub id: i32,
    pub location_id: Option<i32>,
    pub name: String,
    pub address: String,
    pub lot_type: Option<String>,
    pub floor_count: Option<i32>,
    pub total_spaces: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ParkingLot> for ParkingLotResponse {
    fn from(p: ParkingLot) -> Self {
        Self {
            id: p.id,
            location_id: p.location_id,
            name: p.name,
            address: p.address,
            lot_type: p.lot_type,
            floor_count: p.floor_count,
            total_spaces: p.total_spaces,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
