//! Modelo de Allocation
//!
//! Este módulo contiene la entidad Allocation, su identificador opaco,
//! el estado y las estructuras de filtro y patch que usa la capa de storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Identificador opaco de una asignación
///
/// El formato concreto (UUID) queda encapsulado aquí; el resto del sistema
/// sólo conoce `parse` y `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationId(Uuid);

impl AllocationId {
    /// Generar un identificador nuevo
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validar y convertir un identificador recibido como texto
    pub fn parse(value: &str) -> Result<Self, AppError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::InvalidId(value.to_string()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for AllocationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Estado de la asignación - se persiste como texto en minúsculas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    #[default]
    Active,
    Canceled,
}

impl AllocationStatus {
    pub const ALLOWED: [&'static str; 2] = ["active", "canceled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Active => "active",
            AllocationStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for AllocationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AllocationStatus::Active),
            "canceled" => Ok(AllocationStatus::Canceled),
            other => Err(format!("unknown allocation status '{}'", other)),
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocation principal - un vehículo asignado a un empleado en una fecha
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub employee_id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub allocation_date: NaiveDate,
    pub status: AllocationStatus,
}

impl Allocation {
    /// Construir el registro completo a partir de los datos de creación
    /// y el id generado por el storage
    pub fn from_new(id: AllocationId, new: NewAllocation) -> Self {
        Self {
            id,
            employee_id: new.employee_id,
            vehicle_id: new.vehicle_id,
            driver_id: new.driver_id,
            allocation_date: new.allocation_date,
            status: new.status,
        }
    }

    /// Devolver una copia con el patch aplicado. Los campos de identidad
    /// no forman parte del patch, así que nunca cambian.
    pub fn apply(&self, patch: &AllocationPatch) -> Self {
        let mut updated = self.clone();
        if let Some(date) = patch.allocation_date {
            updated.allocation_date = date;
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        updated
    }
}

/// Datos para crear una asignación (sin id todavía)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAllocation {
    pub employee_id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub allocation_date: NaiveDate,
    pub status: AllocationStatus,
}

/// Patch parcial: sólo fecha y estado son modificables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPatch {
    pub allocation_date: Option<NaiveDate>,
    pub status: Option<AllocationStatus>,
}

impl AllocationPatch {
    pub fn is_empty(&self) -> bool {
        self.allocation_date.is_none() && self.status.is_none()
    }
}

/// Filtro de búsqueda: conjunción de igualdades más un límite inferior de fecha
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationFilter {
    pub id: Option<AllocationId>,
    pub employee_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub allocation_date: Option<NaiveDate>,
    pub allocation_date_from: Option<NaiveDate>,
}

impl AllocationFilter {
    pub fn by_id(id: AllocationId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_vehicle_and_date(vehicle_id: &str, date: NaiveDate) -> Self {
        Self {
            vehicle_id: Some(vehicle_id.to_string()),
            allocation_date: Some(date),
            ..Self::default()
        }
    }

    pub fn history(employee_id: Option<String>, vehicle_id: Option<String>) -> Self {
        Self {
            employee_id,
            vehicle_id,
            ..Self::default()
        }
    }

    /// Restringir a fechas iguales o posteriores a `date`
    pub fn dated_from(mut self, date: NaiveDate) -> Self {
        self.allocation_date_from = Some(date);
        self
    }

    /// Evaluar el filtro contra un registro en memoria
    pub fn matches(&self, allocation: &Allocation) -> bool {
        self.id.map_or(true, |id| allocation.id == id)
            && self
                .employee_id
                .as_deref()
                .map_or(true, |e| allocation.employee_id == e)
            && self
                .vehicle_id
                .as_deref()
                .map_or(true, |v| allocation.vehicle_id == v)
            && self
                .allocation_date
                .map_or(true, |d| allocation.allocation_date == d)
            && self
                .allocation_date_from
                .map_or(true, |d| allocation.allocation_date >= d)
    }
}
