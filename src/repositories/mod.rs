//! Repositorios de persistencia
//!
//! Define la interfaz de storage que consume el gestor de asignaciones y
//! sus dos implementaciones: PostgreSQL (sqlx) y memoria.

pub mod allocation_repository;
pub mod memory_repository;

pub use allocation_repository::AllocationRepository;
pub use memory_repository::InMemoryAllocationRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Allocation, AllocationFilter, AllocationId, AllocationPatch, NewAllocation};

/// Errores de la capa de storage
#[derive(Error, Debug)]
pub enum StoreError {
    /// Violación de la restricción única (vehicle_id, allocation_date)
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Escritura de un solo registro sin id en el filtro
    #[error("single-record write requires an id filter")]
    Unscoped,
}

/// Id obligatorio para `update_one` y `delete_one`
pub(crate) fn require_id(filter: &AllocationFilter) -> Result<AllocationId, StoreError> {
    filter.id.ok_or(StoreError::Unscoped)
}

/// Interfaz de storage de asignaciones
///
/// Todos los filtros son conjunciones de igualdades más un límite inferior
/// opcional sobre `allocation_date`. `insert_one` y `update_one` deben
/// rechazar con `StoreError::UniqueViolation` cualquier escritura que deje
/// dos registros con el mismo vehículo y fecha. `update_one` y `delete_one`
/// exigen `id` en el filtro (`StoreError::Unscoped` si falta) y evalúan
/// filtro y escritura como una única operación atómica.
#[async_trait]
pub trait AllocationStore: Send + Sync {
    async fn find_one(&self, filter: &AllocationFilter) -> Result<Option<Allocation>, StoreError>;

    async fn insert_one(&self, allocation: NewAllocation) -> Result<AllocationId, StoreError>;

    async fn update_one(
        &self,
        filter: &AllocationFilter,
        patch: &AllocationPatch,
    ) -> Result<u64, StoreError>;

    async fn delete_one(&self, filter: &AllocationFilter) -> Result<u64, StoreError>;

    async fn find_many(&self, filter: &AllocationFilter) -> Result<Vec<Allocation>, StoreError>;
}
