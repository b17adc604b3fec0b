//! Business logic services for the Lumber Inventory Platform

pub mod allocations;
pub mod audit;
pub mod catalog;
pub mod ledger;
pub mod picking;
pub mod reconciliation;
pub mod reporting;
pub mod transfers;

pub use allocations::AllocationService;
pub use audit::AuditService;
pub use catalog::CatalogService;
pub use ledger::LedgerService;
pub use picking::PickingService;
pub use reconciliation::ReconciliationService;
pub use reporting::ReportingService;
pub use transfers::TransferService;
