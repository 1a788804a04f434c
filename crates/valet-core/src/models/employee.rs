//! Employee model
//!
//! Minimal record for the valets referenced by sessions and log entries.
//! Authentication and role-permission storage live outside this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier
    pub id: i32,

    /// Full name shown in session logs
    pub full_name: String,

    /// Contact e-mail
    pub email: String,

    /// Contact phone
    pub phone: Option<String>,

    /// Position label (e.g. "valet", "dispatcher")
    pub position: Option<String>,

    /// Whether the employee can be assigned to sessions
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for Employee {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            full_name: String::new(),
            email: String::new(),
            phone: None,
            position: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
