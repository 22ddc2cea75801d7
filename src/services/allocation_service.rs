//! Gestor de asignaciones
//!
//! Contiene todas las reglas de negocio: detección de conflictos por
//! vehículo y fecha, legalidad de las modificaciones según la fecha actual
//! y filtrado del historial. No guarda estado entre llamadas; todo vive en
//! el storage.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{Allocation, AllocationFilter, AllocationId, AllocationPatch, NewAllocation};
use crate::repositories::{AllocationStore, StoreError};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Fuente de la fecha actual
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Reloj del sistema (fecha de calendario UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Reloj fijo
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct AllocationManager {
    store: Arc<dyn AllocationStore>,
    clock: Arc<dyn Clock>,
}

impl AllocationManager {
    pub fn new(store: Arc<dyn AllocationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Asignar un vehículo a un empleado para una fecha
    ///
    /// Falla con `AppError::Conflict` si el vehículo ya tiene una asignación
    /// (de cualquier estado) en esa fecha. La consulta previa sólo da un
    /// error más claro; la restricción única del storage decide.
    pub async fn allocate(&self, new: NewAllocation) -> AppResult<Allocation> {
        let slot = AllocationFilter::by_vehicle_and_date(&new.vehicle_id, new.allocation_date);
        if self.store.find_one(&slot).await?.is_some() {
            return Err(conflict(&new.vehicle_id, new.allocation_date));
        }

        let vehicle_id = new.vehicle_id.clone();
        let allocation_date = new.allocation_date;
        let id = self
            .store
            .insert_one(new.clone())
            .await
            .map_err(|e| slot_error(e, &vehicle_id, allocation_date))?;

        info!(
            "🚗 Vehículo {} asignado a {} para {} (id {})",
            vehicle_id, new.employee_id, allocation_date, id
        );
        Ok(Allocation::from_new(id, new))
    }

    /// Obtener una asignación por id
    pub async fn get(&self, id: &AllocationId) -> AppResult<Allocation> {
        self.store
            .find_one(&AllocationFilter::by_id(*id))
            .await?
            .ok_or_else(|| not_found_error("Allocation", &id.to_string()))
    }

    /// Modificar fecha y/o estado de una asignación
    ///
    /// Un patch que no cambia nada falla con `AppError::NoChanges`. Un
    /// cambio de fecha vuelve a comprobar la unicidad contra la fecha nueva.
    pub async fn amend(&self, id: &AllocationId, patch: AllocationPatch) -> AppResult<Allocation> {
        let current = self.get(id).await?;
        let updated = current.apply(&patch);

        if updated == current {
            debug!("Patch sin cambios para allocation {}", id);
            return Err(AppError::NoChanges(id.to_string()));
        }

        if updated.allocation_date != current.allocation_date {
            let slot =
                AllocationFilter::by_vehicle_and_date(&updated.vehicle_id, updated.allocation_date);
            if let Some(other) = self.store.find_one(&slot).await? {
                if other.id != *id {
                    return Err(conflict(&updated.vehicle_id, updated.allocation_date));
                }
            }
        }

        let affected = self
            .store
            .update_one(&AllocationFilter::by_id(*id), &patch)
            .await
            .map_err(|e| slot_error(e, &updated.vehicle_id, updated.allocation_date))?;

        if affected == 0 {
            warn!("Allocation {} desapareció durante la actualización", id);
            return Err(not_found_error("Allocation", &id.to_string()));
        }

        info!("✏️ Allocation {} actualizada", id);
        self.get(id).await
    }

    /// Eliminar una asignación de hoy o futura
    ///
    /// Las asignaciones pasadas son historial y no se borran; el resultado
    /// es el mismo `NotFound` que para un id inexistente.
    pub async fn delete(&self, id: &AllocationId) -> AppResult<()> {
        let today = self.clock.today();
        info!("🗑️ Intentando eliminar allocation {} (hoy {})", id, today);

        let filter = AllocationFilter::by_id(*id).dated_from(today);
        let deleted = self.store.delete_one(&filter).await?;
        debug!("Deleted count: {}", deleted);

        if deleted == 0 {
            return Err(not_found_error("Allocation", &id.to_string()));
        }
        Ok(())
    }

    /// Historial filtrado por empleado y/o vehículo, en el orden del storage
    pub async fn history(
        &self,
        employee_id: Option<String>,
        vehicle_id: Option<String>,
    ) -> AppResult<Vec<Allocation>> {
        let filter = AllocationFilter::history(employee_id, vehicle_id);
        let allocations = self.store.find_many(&filter).await?;
        debug!("📋 Historial: {} asignaciones", allocations.len());
        Ok(allocations)
    }
}

fn conflict(vehicle_id: &str, allocation_date: NaiveDate) -> AppError {
    AppError::Conflict {
        vehicle_id: vehicle_id.to_string(),
        allocation_date,
    }
}

fn slot_error(error: StoreError, vehicle_id: &str, allocation_date: NaiveDate) -> AppError {
    match error {
        StoreError::UniqueViolation(_) => conflict(vehicle_id, allocation_date),
        other => AppError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AllocationStatus;
    use crate::repositories::InMemoryAllocationRepository;
    use async_trait::async_trait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn manager_at(today: NaiveDate) -> AllocationManager {
        AllocationManager::new(
            Arc::new(InMemoryAllocationRepository::new()),
            Arc::new(FixedClock(today)),
        )
    }

    fn new_allocation(employee: &str, vehicle: &str, driver: &str, day: NaiveDate) -> NewAllocation {
        NewAllocation {
            employee_id: employee.to_string(),
            vehicle_id: vehicle.to_string(),
            driver_id: driver.to_string(),
            allocation_date: day,
            status: AllocationStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_allocate_returns_full_record() {
        let manager = manager_at(date(2024, 10, 1));
        let created = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();

        assert_eq!(created.status, AllocationStatus::Active);
        assert_eq!(created.vehicle_id, "veh1");
        assert_eq!(manager.get(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_second_allocation_same_slot_conflicts() {
        let manager = manager_at(date(2024, 10, 1));
        manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();

        let err = manager
            .allocate(new_allocation("emp2", "veh1", "drv2", date(2024, 10, 30)))
            .await
            .unwrap_err();

        match err {
            AppError::Conflict {
                vehicle_id,
                allocation_date,
            } => {
                assert_eq!(vehicle_id, "veh1");
                assert_eq!(allocation_date, date(2024, 10, 30));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(manager.history(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_canceled_allocation_still_blocks_slot() {
        let manager = manager_at(date(2024, 10, 1));
        let created = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();
        manager
            .amend(
                &created.id,
                AllocationPatch {
                    status: Some(AllocationStatus::Canceled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = manager
            .allocate(new_allocation("emp2", "veh1", "drv2", date(2024, 10, 30)))
            .await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    /// Store que esconde los registros existentes a `find_one`, como haría
    /// una inserción concurrente que gana la carrera
    struct RacingStore(InMemoryAllocationRepository);

    #[async_trait]
    impl AllocationStore for RacingStore {
        async fn find_one(&self, _: &AllocationFilter) -> Result<Option<Allocation>, StoreError> {
            Ok(None)
        }
        async fn insert_one(&self, a: NewAllocation) -> Result<AllocationId, StoreError> {
            self.0.insert_one(a).await
        }
        async fn update_one(
            &self,
            f: &AllocationFilter,
            p: &AllocationPatch,
        ) -> Result<u64, StoreError> {
            self.0.update_one(f, p).await
        }
        async fn delete_one(&self, f: &AllocationFilter) -> Result<u64, StoreError> {
            self.0.delete_one(f).await
        }
        async fn find_many(&self, f: &AllocationFilter) -> Result<Vec<Allocation>, StoreError> {
            self.0.find_many(f).await
        }
    }

    #[tokio::test]
    async fn test_store_constraint_is_authoritative() {
        let manager = AllocationManager::new(
            Arc::new(RacingStore(InMemoryAllocationRepository::new())),
            Arc::new(FixedClock(date(2024, 10, 1))),
        );
        manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();

        let result = manager
            .allocate(new_allocation("emp2", "veh1", "drv2", date(2024, 10, 30)))
            .await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_allocations_single_winner() {
        let manager = Arc::new(manager_at(date(2024, 10, 1)));
        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .allocate(new_allocation(&format!("emp{}", i), "veh1", "drv1", date(2024, 10, 30)))
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::Conflict { .. }) => {}
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_amend_keeps_identity_fields() {
        let manager = manager_at(date(2024, 10, 1));
        let created = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();

        let updated = manager
            .amend(
                &created.id,
                AllocationPatch {
                    allocation_date: Some(date(2024, 11, 2)),
                    status: Some(AllocationStatus::Canceled),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.employee_id, created.employee_id);
        assert_eq!(updated.vehicle_id, created.vehicle_id);
        assert_eq!(updated.driver_id, created.driver_id);
        assert_eq!(updated.allocation_date, date(2024, 11, 2));
        assert_eq!(updated.status, AllocationStatus::Canceled);
        assert_eq!(manager.get(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_amend_without_changes_is_no_op() {
        let manager = manager_at(date(2024, 10, 1));
        let created = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();

        let empty = manager.amend(&created.id, AllocationPatch::default()).await;
        assert!(matches!(empty, Err(AppError::NoChanges(_))));

        let same_status = manager
            .amend(
                &created.id,
                AllocationPatch {
                    status: Some(AllocationStatus::Active),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(same_status, Err(AppError::NoChanges(_))));

        let same_date = manager
            .amend(
                &created.id,
                AllocationPatch {
                    allocation_date: Some(date(2024, 10, 30)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(same_date, Err(AppError::NoChanges(_))));
    }

    #[tokio::test]
    async fn test_amend_missing_is_not_found() {
        let manager = manager_at(date(2024, 10, 1));
        let result = manager
            .amend(&AllocationId::generate(), AllocationPatch::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_amend_date_into_taken_slot_conflicts() {
        let manager = manager_at(date(2024, 10, 1));
        manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();
        let second = manager
            .allocate(new_allocation("emp2", "veh1", "drv2", date(2024, 10, 31)))
            .await
            .unwrap();

        let result = manager
            .amend(
                &second.id,
                AllocationPatch {
                    allocation_date: Some(date(2024, 10, 30)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
        assert_eq!(manager.get(&second.id).await.unwrap().allocation_date, date(2024, 10, 31));
    }

    #[tokio::test]
    async fn test_delete_today_and_future_only() {
        let today = date(2024, 10, 30);
        let manager = manager_at(today);
        let yesterday = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 29)))
            .await
            .unwrap();
        let current = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", today))
            .await
            .unwrap();
        let future = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 11, 5)))
            .await
            .unwrap();

        assert!(matches!(
            manager.delete(&yesterday.id).await,
            Err(AppError::NotFound(_))
        ));
        manager.delete(&current.id).await.unwrap();
        manager.delete(&future.id).await.unwrap();

        let remaining = manager.history(None, Some("veh1".into())).await.unwrap();
        assert_eq!(remaining, vec![yesterday]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let manager = manager_at(date(2024, 10, 1));
        let result = manager.delete(&AllocationId::generate()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_filter_composition() {
        let manager = manager_at(date(2024, 10, 1));
        let a = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();
        let b = manager
            .allocate(new_allocation("emp1", "veh2", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();
        let c = manager
            .allocate(new_allocation("emp2", "veh1", "drv2", date(2024, 10, 31)))
            .await
            .unwrap();

        let all = manager.history(None, None).await.unwrap();
        assert_eq!(all, vec![a.clone(), b.clone(), c.clone()]);

        let by_employee = manager.history(Some("emp1".into()), None).await.unwrap();
        assert_eq!(by_employee, vec![a.clone(), b.clone()]);

        let by_vehicle = manager.history(None, Some("veh1".into())).await.unwrap();
        assert_eq!(by_vehicle, vec![a.clone(), c.clone()]);

        let both = manager
            .history(Some("emp1".into()), Some("veh1".into()))
            .await
            .unwrap();
        assert_eq!(both, vec![a]);
        assert!(both.len() <= by_employee.len() && both.len() <= by_vehicle.len());
        assert!(by_employee.len() <= all.len() && by_vehicle.len() <= all.len());

        let none = manager.history(Some("emp9".into()), None).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_allocation_lifecycle_scenario() {
        let manager = manager_at(date(2024, 11, 15));

        let created = manager
            .allocate(new_allocation("emp1", "veh1", "drv1", date(2024, 10, 30)))
            .await
            .unwrap();
        assert_eq!(created.status, AllocationStatus::Active);

        let conflict = manager
            .allocate(new_allocation("emp2", "veh1", "drv2", date(2024, 10, 30)))
            .await;
        assert!(matches!(conflict, Err(AppError::Conflict { .. })));

        let canceled = manager
            .amend(
                &created.id,
                AllocationPatch {
                    status: Some(AllocationStatus::Canceled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(canceled.status, AllocationStatus::Canceled);
        assert_eq!(canceled.id, created.id);
        assert_eq!(canceled.vehicle_id, "veh1");

        assert!(matches!(
            manager.delete(&created.id).await,
            Err(AppError::NotFound(_))
        ));

        let history = manager.history(None, Some("veh1".into())).await.unwrap();
        assert_eq!(history, vec![canceled]);
    }
}
