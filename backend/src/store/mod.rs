//! Persistence for the stock ledger and its dependent tables
//!
//! Every mutating operation runs inside one [`UnitOfWork`]. Dropping a unit of
//! work without calling [`UnitOfWork::commit`] rolls back everything written
//! through it, so an early `?` return can never leave a partial mutation.

use async_trait::async_trait;
use shared::{
    Allocation, AllocationFilter, AllocationStatus, AuditLogEntry, AuditQuery, InventoryItem,
    Location, NewAllocation, NewAuditEntry, NewPickList, NewReconciliation, NewTransfer, PickList,
    Project, ReconciliationReport, StockLevel, Transfer, TransferStatus,
};

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Source of units of work
#[async_trait]
pub trait Store: Send + Sync {
    /// Begin a unit of work
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    /// Connectivity check for health reporting
    async fn ping(&self) -> AppResult<()>;
}

/// Transactional handle over every table the core touches
///
/// Reads that precede a write (`get_stock_level`, `get_transfer`,
/// `get_allocation`, `get_pick_list`) lock the row for the rest of the unit
/// of work where the backend supports it.
#[async_trait]
pub trait UnitOfWork: Send {
    // Catalog
    async fn get_item(&mut self, sku: &str) -> AppResult<Option<InventoryItem>>;
    async fn list_items(&mut self) -> AppResult<Vec<InventoryItem>>;
    /// Fails with `Conflict` when the SKU exists
    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()>;
    async fn update_item(&mut self, item: &InventoryItem) -> AppResult<()>;
    /// Removes the item and every stock, allocation, transfer and pick row for it
    async fn delete_item(&mut self, sku: &str) -> AppResult<bool>;

    // Locations
    async fn get_location(&mut self, location_id: &str) -> AppResult<Option<Location>>;
    async fn list_locations(&mut self) -> AppResult<Vec<Location>>;
    async fn upsert_location(&mut self, location: &Location) -> AppResult<()>;

    // Ledger
    async fn get_stock_level(
        &mut self,
        sku: &str,
        location_id: &str,
    ) -> AppResult<Option<StockLevel>>;
    async fn upsert_stock_level(&mut self, level: &StockLevel) -> AppResult<()>;
    async fn list_stock_levels(&mut self, sku: Option<&str>) -> AppResult<Vec<StockLevel>>;

    // Projects
    async fn get_project(&mut self, project_id: &str) -> AppResult<Option<Project>>;
    async fn list_projects(&mut self) -> AppResult<Vec<Project>>;
    async fn insert_project(&mut self, project: &Project) -> AppResult<()>;
    async fn update_project(&mut self, project: &Project) -> AppResult<()>;

    // Allocations
    async fn insert_allocation(&mut self, allocation: &NewAllocation) -> AppResult<Allocation>;
    async fn get_allocation(&mut self, id: i64) -> AppResult<Option<Allocation>>;
    /// Ordered by id, oldest first
    async fn list_allocations(&mut self, filter: &AllocationFilter) -> AppResult<Vec<Allocation>>;
    async fn set_allocation_status(&mut self, id: i64, status: AllocationStatus) -> AppResult<()>;

    // Pick lists
    async fn insert_pick_list(&mut self, pick: &NewPickList) -> AppResult<PickList>;
    async fn get_pick_list(&mut self, id: i64) -> AppResult<Option<PickList>>;
    /// Ordered by id, oldest first
    async fn list_pick_lists(&mut self, project_id: Option<&str>) -> AppResult<Vec<PickList>>;
    async fn update_pick_list(&mut self, pick: &PickList) -> AppResult<()>;

    // Transfers
    async fn insert_transfer(&mut self, transfer: &NewTransfer, requested_by: &str)
        -> AppResult<Transfer>;
    async fn get_transfer(&mut self, id: i64) -> AppResult<Option<Transfer>>;
    /// Newest first
    async fn list_transfers(&mut self, status: Option<TransferStatus>) -> AppResult<Vec<Transfer>>;
    async fn update_transfer(&mut self, transfer: &Transfer) -> AppResult<()>;
    async fn delete_transfer(&mut self, id: i64) -> AppResult<bool>;

    // Audit
    async fn insert_audit(&mut self, entry: &NewAuditEntry) -> AppResult<AuditLogEntry>;
    async fn list_audit(&mut self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>>;

    // Reconciliation
    async fn insert_reconciliation(
        &mut self,
        report: &NewReconciliation,
    ) -> AppResult<ReconciliationReport>;
    async fn get_reconciliation(&mut self, id: i64) -> AppResult<Option<ReconciliationReport>>;
    /// Newest first
    async fn list_reconciliations(
        &mut self,
        location_id: Option<&str>,
    ) -> AppResult<Vec<ReconciliationReport>>;

    /// Make every write visible atomically
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
