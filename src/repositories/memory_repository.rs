//! Storage en memoria
//!
//! Se usa en tests y cuando no hay `DATABASE_URL` configurada. Mantiene el
//! orden de inserción y aplica la misma restricción única que PostgreSQL.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{require_id, AllocationStore, StoreError};
use crate::models::{Allocation, AllocationFilter, AllocationId, AllocationPatch, NewAllocation};

#[derive(Debug, Default)]
pub struct InMemoryAllocationRepository {
    records: RwLock<Vec<Allocation>>,
}

impl InMemoryAllocationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot_taken(records: &[Allocation], candidate: &Allocation) -> bool {
    records.iter().any(|r| {
        r.id != candidate.id
            && r.vehicle_id == candidate.vehicle_id
            && r.allocation_date == candidate.allocation_date
    })
}

fn unique_violation(allocation: &Allocation) -> StoreError {
    StoreError::UniqueViolation(format!(
        "vehicle_id={} allocation_date={}",
        allocation.vehicle_id, allocation.allocation_date
    ))
}

#[async_trait]
impl AllocationStore for InMemoryAllocationRepository {
    async fn find_one(&self, filter: &AllocationFilter) -> Result<Option<Allocation>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn insert_one(&self, allocation: NewAllocation) -> Result<AllocationId, StoreError> {
        let mut records = self.records.write().await;
        let allocation = Allocation::from_new(AllocationId::generate(), allocation);

        if slot_taken(&records, &allocation) {
            return Err(unique_violation(&allocation));
        }

        let id = allocation.id;
        records.push(allocation);
        debug!("💾 Allocation {} insertada en memoria", id);
        Ok(id)
    }

    async fn update_one(
        &self,
        filter: &AllocationFilter,
        patch: &AllocationPatch,
    ) -> Result<u64, StoreError> {
        require_id(filter)?;
        let mut records = self.records.write().await;

        let Some(index) = records.iter().position(|r| filter.matches(r)) else {
            return Ok(0);
        };

        let updated = records[index].apply(patch);
        if slot_taken(&records, &updated) {
            return Err(unique_violation(&updated));
        }

        records[index] = updated;
        Ok(1)
    }

    async fn delete_one(&self, filter: &AllocationFilter) -> Result<u64, StoreError> {
        require_id(filter)?;
        let mut records = self.records.write().await;

        match records.iter().position(|r| filter.matches(r)) {
            Some(index) => {
                records.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_many(&self, filter: &AllocationFilter) -> Result<Vec<Allocation>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }
}
