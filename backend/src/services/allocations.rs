//! Project allocations
//!
//! A reservation earmarks stock for a project without debiting it. The ledger
//! only moves when the reservation is picked.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    available_to_allocate, validate_location_id, validate_positive_quantity, validate_sku, Actor,
    Allocation, AllocationAction, AllocationFilter, AllocationRequest, AuditAction,
    BulkAllocationResult, BulkRowResult, NewAllocation, NewAuditEntry, Project, StateMachine,
};

use crate::error::{AppError, AppResult};
use crate::services::audit;
use crate::services::ledger::{get_quantity, require_item, require_physical_location};
use crate::store::{Store, UnitOfWork};

/// Allocatable quantity of a SKU at one location
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub sku: String,
    pub location_id: String,
    pub on_hand: i32,
    pub reserved: i32,
    pub available: i32,
}

/// Sum of Reserved allocations at (sku, location) within the unit of work
pub(crate) async fn reserved_at(uow: &mut dyn UnitOfWork, sku: &str, location_id: &str) -> AppResult<i32> {
    let reserved = uow
        .list_allocations(&AllocationFilter::reserved_at(sku, location_id))
        .await?;
    Ok(reserved
        .iter()
        .fold(0i32, |total, a| total.saturating_add(a.quantity)))
}

async fn availability_in(
    uow: &mut dyn UnitOfWork,
    sku: &str,
    location_id: &str,
) -> AppResult<Availability> {
    let on_hand = get_quantity(uow, sku, location_id).await?;
    let reserved = reserved_at(uow, sku, location_id).await?;
    Ok(Availability {
        sku: sku.to_string(),
        location_id: location_id.to_string(),
        on_hand,
        reserved,
        available: available_to_allocate(on_hand, reserved),
    })
}

pub(crate) async fn require_project(uow: &mut dyn UnitOfWork, project_id: &str) -> AppResult<Project> {
    uow.get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))
}

#[derive(Clone)]
pub struct AllocationService {
    store: Arc<dyn Store>,
}

impl AllocationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Reserve stock for a project
    pub async fn allocate(
        &self,
        actor: &Actor,
        project_id: &str,
        request: &AllocationRequest,
    ) -> AppResult<Allocation> {
        validate_sku(&request.sku).map_err(|e| AppError::validation("sku", e))?;
        validate_location_id(&request.source_location)
            .map_err(|e| AppError::validation("source_location", e))?;
        validate_positive_quantity(request.quantity)
            .map_err(|e| AppError::validation("quantity", e))?;

        let mut uow = self.store.begin().await?;
        require_project(uow.as_mut(), project_id).await?;
        require_item(uow.as_mut(), &request.sku).await?;
        require_physical_location(uow.as_mut(), "source_location", &request.source_location)
            .await?;

        let availability =
            availability_in(uow.as_mut(), &request.sku, &request.source_location).await?;
        if request.quantity > availability.available {
            return Err(AppError::insufficient(
                &request.sku,
                &request.source_location,
                availability.available,
                request.quantity,
            ));
        }

        let allocation = uow
            .insert_allocation(&NewAllocation {
                project_id: project_id.to_string(),
                sku: request.sku.clone(),
                source_location: request.source_location.clone(),
                quantity: request.quantity,
                allocated_by: actor.email.clone(),
            })
            .await?;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::Allocation,
                format!(
                    "Reserved {} for {} (allocation #{})",
                    allocation.quantity, project_id, allocation.id
                ),
            )
            .sku(&allocation.sku)
            .location(&allocation.source_location),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(
            allocation_id = allocation.id,
            project_id,
            sku = %allocation.sku,
            quantity = allocation.quantity,
            "Stock reserved by {}",
            actor
        );

        Ok(allocation)
    }

    /// Allocate row by row; each row commits or fails on its own
    pub async fn bulk_allocate(
        &self,
        actor: &Actor,
        project_id: &str,
        rows: &[AllocationRequest],
    ) -> AppResult<BulkAllocationResult> {
        {
            let mut uow = self.store.begin().await?;
            require_project(uow.as_mut(), project_id).await?;
        }

        let mut results = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let result = match self.allocate(actor, project_id, row).await {
                Ok(allocation) => BulkRowResult {
                    row: index + 1,
                    sku: row.sku.clone(),
                    success: true,
                    message: format!("Reserved {} at {}", row.quantity, row.source_location),
                    allocation_id: Some(allocation.id),
                },
                Err(e) => BulkRowResult {
                    row: index + 1,
                    sku: row.sku.clone(),
                    success: false,
                    message: e.to_string(),
                    allocation_id: None,
                },
            };
            results.push(result);
        }

        let summary = BulkAllocationResult::from_rows(project_id, results);
        tracing::info!(
            project_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk allocation finished"
        );
        Ok(summary)
    }

    /// Release a reservation
    pub async fn cancel(&self, actor: &Actor, id: i64) -> AppResult<Allocation> {
        let mut uow = self.store.begin().await?;
        let mut allocation = uow
            .get_allocation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Allocation {}", id)))?;
        let next = allocation.status.apply(AllocationAction::Cancel)?;

        uow.set_allocation_status(id, next).await?;
        allocation.status = next;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::Allocation,
                format!(
                    "Released {} for {} (allocation #{} cancelled)",
                    allocation.quantity, allocation.project_id, allocation.id
                ),
            )
            .sku(&allocation.sku)
            .location(&allocation.source_location),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(allocation_id = id, "Allocation cancelled by {}", actor);
        Ok(allocation)
    }

    pub async fn list(&self, filter: &AllocationFilter) -> AppResult<Vec<Allocation>> {
        let mut uow = self.store.begin().await?;
        uow.list_allocations(filter).await
    }

    pub async fn available(&self, sku: &str, location_id: &str) -> AppResult<Availability> {
        let mut uow = self.store.begin().await?;
        require_item(uow.as_mut(), sku).await?;
        availability_in(uow.as_mut(), sku, location_id).await
    }
}
