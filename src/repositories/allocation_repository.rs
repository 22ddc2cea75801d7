use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{require_id, AllocationStore, StoreError};
use crate::models::{
    Allocation, AllocationFilter, AllocationId, AllocationPatch, AllocationStatus, NewAllocation,
};

const SELECT_COLUMNS: &str =
    "SELECT id, employee_id, vehicle_id, driver_id, allocation_date, status, created_at FROM allocations";

// Fila tal como vive en la tabla allocations
#[derive(Debug, sqlx::FromRow)]
struct AllocationRow {
    id: Uuid,
    employee_id: String,
    vehicle_id: String,
    driver_id: String,
    allocation_date: NaiveDate,
    status: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl TryFrom<AllocationRow> for Allocation {
    type Error = StoreError;

    fn try_from(row: AllocationRow) -> Result<Self, Self::Error> {
        let status: AllocationStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("allocation {}: {}", row.id, e)))?;

        Ok(Allocation {
            id: row.id.into(),
            employee_id: row.employee_id,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            allocation_date: row.allocation_date,
            status,
        })
    }
}

/// Repositorio PostgreSQL de asignaciones
///
/// La restricción `allocations_vehicle_date_key` es la fuente de verdad
/// para la unicidad (vehicle_id, allocation_date).
pub struct AllocationRepository {
    pool: PgPool,
}

impl AllocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Añadir el filtro como cláusulas `AND` sobre un `WHERE TRUE` ya presente
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &AllocationFilter) {
    if let Some(id) = filter.id {
        builder.push(" AND id = ").push_bind(id.as_uuid());
    }
    if let Some(employee_id) = &filter.employee_id {
        builder.push(" AND employee_id = ").push_bind(employee_id.clone());
    }
    if let Some(vehicle_id) = &filter.vehicle_id {
        builder.push(" AND vehicle_id = ").push_bind(vehicle_id.clone());
    }
    if let Some(date) = filter.allocation_date {
        builder.push(" AND allocation_date = ").push_bind(date);
    }
    if let Some(from) = filter.allocation_date_from {
        builder.push(" AND allocation_date >= ").push_bind(from);
    }
}

/// `UPDATE` de un registro. El filtro va directo en el `WHERE` para que
/// la comprobación y la escritura ocurran sobre la misma fila bloqueada.
fn update_statement<'a>(
    filter: &AllocationFilter,
    patch: &AllocationPatch,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    require_id(filter)?;

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE allocations SET ");
    {
        let mut set = builder.separated(", ");
        // `id = id` mantiene el SQL válido con un patch vacío
        set.push("id = id");
        if let Some(date) = patch.allocation_date {
            set.push("allocation_date = ").push_bind_unseparated(date);
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
    }
    builder.push(" WHERE TRUE");
    push_filter(&mut builder, filter);
    Ok(builder)
}

/// `DELETE` de un registro con el filtro directo en el `WHERE`
fn delete_statement<'a>(
    filter: &AllocationFilter,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    require_id(filter)?;

    let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM allocations WHERE TRUE");
    push_filter(&mut builder, filter);
    Ok(builder)
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(db.message().to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl AllocationStore for AllocationRepository {
    async fn find_one(&self, filter: &AllocationFilter) -> Result<Option<Allocation>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push(" WHERE TRUE");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let row = builder
            .build_query_as::<AllocationRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(Allocation::try_from).transpose()
    }

    async fn insert_one(&self, allocation: NewAllocation) -> Result<AllocationId, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO allocations (id, employee_id, vehicle_id, driver_id, allocation_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(allocation.employee_id)
        .bind(allocation.vehicle_id)
        .bind(allocation.driver_id)
        .bind(allocation.allocation_date)
        .bind(allocation.status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!("💾 Allocation {} insertada", id);
        Ok(id.into())
    }

    async fn update_one(
        &self,
        filter: &AllocationFilter,
        patch: &AllocationPatch,
    ) -> Result<u64, StoreError> {
        let mut builder = update_statement(filter, patch)?;
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, filter: &AllocationFilter) -> Result<u64, StoreError> {
        let mut builder = delete_statement(filter)?;
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_many(&self, filter: &AllocationFilter) -> Result<Vec<Allocation>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push(" WHERE TRUE");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id");

        let rows = builder
            .build_query_as::<AllocationRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Allocation::try_from).collect()
    }
}
