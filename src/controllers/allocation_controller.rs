use std::sync::Arc;
use validator::Validate;

use crate::dto::allocation_dto::{
    AllocationResponse, CreateAllocationRequest, HistoryQuery, UpdateAllocationRequest,
};
use crate::models::{AllocationId, AllocationPatch, AllocationStatus, NewAllocation};
use crate::services::AllocationManager;
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::{non_blank, normalize_date, validate_status};

pub struct AllocationController {
    manager: Arc<AllocationManager>,
}

impl AllocationController {
    pub fn new(manager: Arc<AllocationManager>) -> Self {
        Self { manager }
    }

    pub async fn create(&self, request: CreateAllocationRequest) -> AppResult<AllocationResponse> {
        request.validate()?;

        let allocation_date = parse_date(&request.allocation_date)?;
        let status = match request.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => AllocationStatus::Active,
        };

        let allocation = self
            .manager
            .allocate(NewAllocation {
                employee_id: request.employee_id,
                vehicle_id: request.vehicle_id,
                driver_id: request.driver_id,
                allocation_date,
                status,
            })
            .await?;

        Ok(allocation.into())
    }

    pub async fn get_by_id(&self, raw_id: &str) -> AppResult<AllocationResponse> {
        let id = AllocationId::parse(raw_id)?;
        Ok(self.manager.get(&id).await?.into())
    }

    pub async fn update(
        &self,
        raw_id: &str,
        request: UpdateAllocationRequest,
    ) -> AppResult<AllocationResponse> {
        let id = AllocationId::parse(raw_id)?;

        let patch = AllocationPatch {
            allocation_date: request.allocation_date.as_deref().map(parse_date).transpose()?,
            status: request.status.as_deref().map(parse_status).transpose()?,
        };

        Ok(self.manager.amend(&id, patch).await?.into())
    }

    pub async fn delete(&self, raw_id: &str) -> AppResult<()> {
        let id = AllocationId::parse(raw_id)?;
        self.manager.delete(&id).await
    }

    pub async fn history(&self, query: HistoryQuery) -> AppResult<Vec<AllocationResponse>> {
        let allocations = self
            .manager
            .history(non_blank(query.employee_id), non_blank(query.vehicle_id))
            .await?;

        Ok(allocations.into_iter().map(AllocationResponse::from).collect())
    }
}

fn parse_date(raw: &str) -> AppResult<chrono::NaiveDate> {
    normalize_date(raw).map_err(|_| {
        validation_error(
            "allocation_date",
            format!("'{}' is not a valid calendar date (YYYY-MM-DD)", raw),
        )
    })
}

fn parse_status(raw: &str) -> AppResult<AllocationStatus> {
    validate_status(raw).map_err(|_| {
        validation_error(
            "status",
            format!(
                "'{}' is not a valid status, expected one of {:?}",
                raw,
                AllocationStatus::ALLOWED
            ),
        )
    })
}
