//! Location and parking lot models
//!
//! A location is a serviced site (a residential complex, an office tower);
//! each location can have several parking lots where the valets leave cars.
//! Administered in a back office; this service reads them for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serviced location entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier
    pub id: i32,

    /// Display name
    pub name: String,

    /// Street address
    pub address: String,

    /// Latitude of the entrance
    pub latitude: Option<f64>,

    /// Longitude of the entrance
    pub longitude: Option<f64>,

    /// Longer description shown to dispatchers
    pub description: Option<String>,

    /// Whether the location is currently serviced
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for Location {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            address: String::new(),
            latitude: None,
            longitude: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Parking lot attached to a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingLot {
    /// Unique identifier
    pub id: i32,

    /// Location the lot belongs to
    pub location_id: Option<i32>,

    /// Display name
    pub name: String,

    /// Street address
    pub address: String,

    /// Lot kind ("open", "covered", "underground", ...)
    pub lot_type: Option<String>,

    /// Number of floors (multi-storey lots)
    pub floor_count: Option<i32>,

    /// Total parking spaces
    pub total_spaces: Option<i32>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ParkingLot {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            location_id: None,
            name: String::new(),
            address: String::new(),
            lot_type: None,
            floor_count: None,
            total_spaces: None,
            created_at: now,
            updated_at: now,
        }
    }
}
