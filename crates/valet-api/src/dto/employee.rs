//! Employee DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use valet_core::models::Employee;

/// Employee response body
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeResponse {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            full_name: e.full_name,
            email: e.email,
            phone: e.phone,
            position: e.position,
            is_active: e.is_active,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}
