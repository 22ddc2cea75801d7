use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Allocation;
use crate::utils::validation::validate_identifier;

// Request para crear una asignación
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAllocationRequest {
    #[validate(length(min = 1), custom = "validate_identifier")]
    pub employee_id: String,

    #[validate(length(min = 1), custom = "validate_identifier")]
    pub vehicle_id: String,

    #[validate(length(min = 1), custom = "validate_identifier")]
    pub driver_id: String,

    pub allocation_date: String,

    pub status: Option<String>,
}

// Request para modificar una asignación: sólo fecha y estado
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAllocationRequest {
    pub allocation_date: Option<String>,
    pub status: Option<String>,
}

// Filtros del historial
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub employee_id: Option<String>,
    pub vehicle_id: Option<String>,
}

// Response de asignación
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationResponse {
    pub id: String,
    pub employee_id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub allocation_date: String,
    pub status: String,
}

impl From<Allocation> for AllocationResponse {
    fn from(allocation: Allocation) -> Self {
        Self {
            id: allocation.id.to_string(),
            employee_id: allocation.employee_id,
            vehicle_id: allocation.vehicle_id,
            driver_id: allocation.driver_id,
            allocation_date: allocation.allocation_date.format("%Y-%m-%d").to_string(),
            status: allocation.status.to_string(),
        }
    }
}
