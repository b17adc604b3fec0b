//! In-process store used for local development and tests
//!
//! A unit of work holds the store mutex for its whole lifetime and writes to a
//! private copy of the tables, which replaces the shared tables only on commit.
//! Tables sit behind `Arc` so the copy is cheap and a table is cloned only when
//! the unit first writes to it. Audit entries are append-only and are buffered
//! in the unit until commit. Writers are therefore fully serialized and an
//! abandoned unit of work leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    Allocation, AllocationFilter, AllocationStatus, AuditLogEntry, AuditQuery, InventoryItem,
    Location, NewAllocation, NewAuditEntry, NewPickList, NewReconciliation, NewTransfer, PickList,
    PickStatus, Project, ReconciliationReport, StockLevel, Transfer, TransferStatus,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, UnitOfWork};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct MemoryState {
    tables: Tables,
    audit: Vec<AuditLogEntry>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    items: Arc<BTreeMap<String, InventoryItem>>,
    locations: Arc<BTreeMap<String, Location>>,
    stock: Arc<BTreeMap<(String, String), StockLevel>>,
    projects: Arc<BTreeMap<String, Project>>,
    allocations: Arc<BTreeMap<i64, Allocation>>,
    pick_lists: Arc<BTreeMap<i64, PickList>>,
    transfers: Arc<BTreeMap<i64, Transfer>>,
    reconciliations: Arc<BTreeMap<i64, ReconciliationReport>>,
    sequences: Sequences,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    allocation: i64,
    pick_list: i64,
    transfer: i64,
    audit: i64,
    reconciliation: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

/// Shared in-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.tables.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            work,
            pending_audit: Vec::new(),
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    work: Tables,
    pending_audit: Vec<AuditLogEntry>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn get_item(&mut self, sku: &str) -> AppResult<Option<InventoryItem>> {
        Ok(self.work.items.get(sku).cloned())
    }

    async fn list_items(&mut self) -> AppResult<Vec<InventoryItem>> {
        Ok(self.work.items.values().cloned().collect())
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        if self.work.items.contains_key(&item.sku) {
            return Err(AppError::Conflict {
                resource: "sku".to_string(),
                message: format!("SKU {} already exists", item.sku),
            });
        }
        Arc::make_mut(&mut self.work.items).insert(item.sku.clone(), item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        match Arc::make_mut(&mut self.work.items).get_mut(&item.sku) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Item {}", item.sku))),
        }
    }

    async fn delete_item(&mut self, sku: &str) -> AppResult<bool> {
        if !self.work.items.contains_key(sku) {
            return Ok(false);
        }
        Arc::make_mut(&mut self.work.items).remove(sku);
        Arc::make_mut(&mut self.work.stock).retain(|(s, _), _| s != sku);
        Arc::make_mut(&mut self.work.allocations).retain(|_, a| a.sku != sku);
        Arc::make_mut(&mut self.work.transfers).retain(|_, t| t.sku != sku);
        Arc::make_mut(&mut self.work.pick_lists).retain(|_, p| p.sku != sku);
        Ok(true)
    }

    async fn get_location(&mut self, location_id: &str) -> AppResult<Option<Location>> {
        Ok(self.work.locations.get(location_id).cloned())
    }

    async fn list_locations(&mut self) -> AppResult<Vec<Location>> {
        Ok(self.work.locations.values().cloned().collect())
    }

    async fn upsert_location(&mut self, location: &Location) -> AppResult<()> {
        Arc::make_mut(&mut self.work.locations)
            .insert(location.location_id.clone(), location.clone());
        Ok(())
    }

    async fn get_stock_level(
        &mut self,
        sku: &str,
        location_id: &str,
    ) -> AppResult<Option<StockLevel>> {
        Ok(self
            .work
            .stock
            .get(&(sku.to_string(), location_id.to_string()))
            .cloned())
    }

    async fn upsert_stock_level(&mut self, level: &StockLevel) -> AppResult<()> {
        Arc::make_mut(&mut self.work.stock).insert(
            (level.sku.clone(), level.location_id.clone()),
            level.clone(),
        );
        Ok(())
    }

    async fn list_stock_levels(&mut self, sku: Option<&str>) -> AppResult<Vec<StockLevel>> {
        Ok(self
            .work
            .stock
            .values()
            .filter(|l| sku.map_or(true, |s| l.sku == s))
            .cloned()
            .collect())
    }

    async fn get_project(&mut self, project_id: &str) -> AppResult<Option<Project>> {
        Ok(self.work.projects.get(project_id).cloned())
    }

    async fn list_projects(&mut self) -> AppResult<Vec<Project>> {
        Ok(self.work.projects.values().cloned().collect())
    }

    async fn insert_project(&mut self, project: &Project) -> AppResult<()> {
        if self.work.projects.contains_key(&project.project_id) {
            return Err(AppError::Conflict {
                resource: "project_id".to_string(),
                message: format!("Project {} already exists", project.project_id),
            });
        }
        Arc::make_mut(&mut self.work.projects)
            .insert(project.project_id.clone(), project.clone());
        Ok(())
    }

    async fn update_project(&mut self, project: &Project) -> AppResult<()> {
        match Arc::make_mut(&mut self.work.projects).get_mut(&project.project_id) {
            Some(existing) => {
                *existing = project.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Project {}", project.project_id))),
        }
    }

    async fn insert_allocation(&mut self, allocation: &NewAllocation) -> AppResult<Allocation> {
        let now = Utc::now();
        let row = Allocation {
            id: next(&mut self.work.sequences.allocation),
            project_id: allocation.project_id.clone(),
            sku: allocation.sku.clone(),
            source_location: allocation.source_location.clone(),
            quantity: allocation.quantity,
            status: AllocationStatus::Reserved,
            allocated_by: allocation.allocated_by.clone(),
            created_at: now,
            updated_at: now,
        };
        Arc::make_mut(&mut self.work.allocations).insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_allocation(&mut self, id: i64) -> AppResult<Option<Allocation>> {
        Ok(self.work.allocations.get(&id).cloned())
    }

    async fn list_allocations(&mut self, filter: &AllocationFilter) -> AppResult<Vec<Allocation>> {
        Ok(self
            .work
            .allocations
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn set_allocation_status(&mut self, id: i64, status: AllocationStatus) -> AppResult<()> {
        let allocation = Arc::make_mut(&mut self.work.allocations)
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Allocation {}", id)))?;
        allocation.status = status;
        allocation.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_pick_list(&mut self, pick: &NewPickList) -> AppResult<PickList> {
        let row = PickList {
            id: next(&mut self.work.sequences.pick_list),
            project_id: pick.project_id.clone(),
            allocation_id: pick.allocation_id,
            sku: pick.sku.clone(),
            quantity_requested: pick.quantity_requested,
            pick_from_location: pick.pick_from_location.clone(),
            quantity_picked: 0,
            status: PickStatus::Pending,
            picked_by: None,
            pick_date: None,
            created_at: Utc::now(),
        };
        Arc::make_mut(&mut self.work.pick_lists).insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_pick_list(&mut self, id: i64) -> AppResult<Option<PickList>> {
        Ok(self.work.pick_lists.get(&id).cloned())
    }

    async fn list_pick_lists(&mut self, project_id: Option<&str>) -> AppResult<Vec<PickList>> {
        Ok(self
            .work
            .pick_lists
            .values()
            .filter(|p| project_id.map_or(true, |id| p.project_id == id))
            .cloned()
            .collect())
    }

    async fn update_pick_list(&mut self, pick: &PickList) -> AppResult<()> {
        match Arc::make_mut(&mut self.work.pick_lists).get_mut(&pick.id) {
            Some(existing) => {
                *existing = pick.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Pick list {}", pick.id))),
        }
    }

    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
        requested_by: &str,
    ) -> AppResult<Transfer> {
        let row = Transfer {
            id: next(&mut self.work.sequences.transfer),
            sku: transfer.sku.clone(),
            quantity: transfer.quantity,
            from_location: transfer.from_location.clone(),
            to_location: transfer.to_location.clone(),
            status: TransferStatus::Requested,
            request_date: Utc::now(),
            shipped_date: None,
            received_date: None,
            requested_by: requested_by.to_string(),
            received_by: None,
            quantity_received: None,
            notes: transfer.notes.clone(),
        };
        Arc::make_mut(&mut self.work.transfers).insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_transfer(&mut self, id: i64) -> AppResult<Option<Transfer>> {
        Ok(self.work.transfers.get(&id).cloned())
    }

    async fn list_transfers(&mut self, status: Option<TransferStatus>) -> AppResult<Vec<Transfer>> {
        Ok(self
            .work
            .transfers
            .values()
            .rev()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect())
    }

    async fn update_transfer(&mut self, transfer: &Transfer) -> AppResult<()> {
        match Arc::make_mut(&mut self.work.transfers).get_mut(&transfer.id) {
            Some(existing) => {
                *existing = transfer.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Transfer {}", transfer.id))),
        }
    }

    async fn delete_transfer(&mut self, id: i64) -> AppResult<bool> {
        Ok(Arc::make_mut(&mut self.work.transfers).remove(&id).is_some())
    }

    async fn insert_audit(&mut self, entry: &NewAuditEntry) -> AppResult<AuditLogEntry> {
        let row = AuditLogEntry {
            id: next(&mut self.work.sequences.audit),
            timestamp: Utc::now(),
            actor: entry.actor.clone(),
            action: entry.action,
            sku: entry.sku.clone(),
            location_id: entry.location_id.clone(),
            quantity_before: entry.quantity_before,
            quantity_after: entry.quantity_after,
            reason: entry.reason.clone(),
            notes: entry.notes.clone(),
        };
        self.pending_audit.push(row.clone());
        Ok(row)
    }

    async fn list_audit(&mut self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        Ok(self
            .guard
            .audit
            .iter()
            .chain(self.pending_audit.iter())
            .rev()
            .filter(|e| query.matches(e))
            .take(query.effective_limit() as usize)
            .cloned()
            .collect())
    }

    async fn insert_reconciliation(
        &mut self,
        report: &NewReconciliation,
    ) -> AppResult<ReconciliationReport> {
        let row = ReconciliationReport {
            id: next(&mut self.work.sequences.reconciliation),
            location_id: report.location_id.clone(),
            submitted_by: report.submitted_by.clone(),
            submitted_at: Utc::now(),
            discrepancy_count: report.discrepancy_count(),
            applied: report.applied,
            notes: report.notes.clone(),
            lines: report.lines.clone(),
        };
        Arc::make_mut(&mut self.work.reconciliations).insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_reconciliation(&mut self, id: i64) -> AppResult<Option<ReconciliationReport>> {
        Ok(self.work.reconciliations.get(&id).cloned())
    }

    async fn list_reconciliations(
        &mut self,
        location_id: Option<&str>,
    ) -> AppResult<Vec<ReconciliationReport>> {
        Ok(self
            .work
            .reconciliations
            .values()
            .rev()
            .filter(|r| location_id.map_or(true, |l| r.location_id == l))
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork {
            mut guard,
            work,
            pending_audit,
        } = *self;
        guard.tables = work;
        guard.audit.extend(pending_audit);
        Ok(())
    }
}
