//! Physical count reconciliation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One counted SKU as submitted from the floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedItem {
    pub sku: String,
    pub system_qty: i32,
    pub counted_qty: i32,
}

/// Counted versus system quantity for one SKU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationLine {
    pub sku: String,
    pub system_qty: i32,
    pub counted_qty: i32,
    /// `counted_qty - system_qty`
    pub difference: i32,
}

impl ReconciliationLine {
    pub fn is_discrepancy(&self) -> bool {
        self.difference != 0
    }
}

impl From<&CountedItem> for ReconciliationLine {
    fn from(item: &CountedItem) -> Self {
        Self {
            sku: item.sku.clone(),
            system_qty: item.system_qty,
            counted_qty: item.counted_qty,
            difference: item.counted_qty - item.system_qty,
        }
    }
}

/// A submitted count for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub id: i64,
    pub location_id: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub discrepancy_count: i32,
    /// Whether counted quantities were written back to the ledger
    pub applied: bool,
    pub notes: Option<String>,
    pub lines: Vec<ReconciliationLine>,
}

impl ReconciliationReport {
    pub fn discrepancies(&self) -> impl Iterator<Item = &ReconciliationLine> {
        self.lines.iter().filter(|l| l.is_discrepancy())
    }
}

/// Report row to persist
#[derive(Debug, Clone)]
pub struct NewReconciliation {
    pub location_id: String,
    pub submitted_by: String,
    pub notes: Option<String>,
    pub applied: bool,
    pub lines: Vec<ReconciliationLine>,
}

impl NewReconciliation {
    pub fn discrepancy_count(&self) -> i32 {
        self.lines.iter().filter(|l| l.is_discrepancy()).count() as i32
    }
}

/// Diff every counted item against its system quantity
pub fn reconcile(items: &[CountedItem]) -> Vec<ReconciliationLine> {
    items.iter().map(ReconciliationLine::from).collect()
}
