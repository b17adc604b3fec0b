//! Project reservations against location stock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::{ParseStatusError, StateMachine};

/// A soft hold of stock at one location for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub project_id: String,
    pub sku: String,
    pub source_location: String,
    pub quantity: i32,
    pub status: AllocationStatus,
    pub allocated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation lifecycle
///
/// ```text
/// Reserved --pull--> Pulled
/// Reserved --cancel--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Reserved,
    Pulled,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationAction {
    Pull,
    Cancel,
}

impl std::fmt::Display for AllocationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationAction::Pull => write!(f, "pull"),
            AllocationAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl StateMachine for AllocationStatus {
    type Action = AllocationAction;
    const ENTITY: &'static str = "allocation";

    fn next(self, action: AllocationAction) -> Option<Self> {
        match (self, action) {
            (AllocationStatus::Reserved, AllocationAction::Pull) => Some(AllocationStatus::Pulled),
            (AllocationStatus::Reserved, AllocationAction::Cancel) => {
                Some(AllocationStatus::Cancelled)
            }
            _ => None,
        }
    }
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Reserved => "reserved",
            AllocationStatus::Pulled => "pulled",
            AllocationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationStatus::Reserved => write!(f, "Reserved"),
            AllocationStatus::Pulled => write!(f, "Pulled"),
            AllocationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for AllocationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(AllocationStatus::Reserved),
            "pulled" => Ok(AllocationStatus::Pulled),
            "cancelled" => Ok(AllocationStatus::Cancelled),
            _ => Err(ParseStatusError::new("allocation status", s)),
        }
    }
}

/// Row to insert for a new reservation
#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub project_id: String,
    pub sku: String,
    pub source_location: String,
    pub quantity: i32,
    pub allocated_by: String,
}

/// One requested reservation, as submitted singly or as a bulk row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub sku: String,
    pub source_location: String,
    pub quantity: i32,
}

/// Filter for allocation lookups; `None` fields match anything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocationFilter {
    pub project_id: Option<String>,
    pub sku: Option<String>,
    pub source_location: Option<String>,
    pub status: Option<AllocationStatus>,
}

impl AllocationFilter {
    pub fn reserved_at(sku: &str, location_id: &str) -> Self {
        Self {
            sku: Some(sku.to_string()),
            source_location: Some(location_id.to_string()),
            status: Some(AllocationStatus::Reserved),
            ..Default::default()
        }
    }

    pub fn matches(&self, allocation: &Allocation) -> bool {
        self.project_id
            .as_ref()
            .map_or(true, |p| *p == allocation.project_id)
            && self.sku.as_ref().map_or(true, |s| *s == allocation.sku)
            && self
                .source_location
                .as_ref()
                .map_or(true, |l| *l == allocation.source_location)
            && self.status.map_or(true, |s| s == allocation.status)
    }
}

/// Sum of Reserved quantities for one SKU at one location
pub fn reserved_total(allocations: &[Allocation], sku: &str, location_id: &str) -> i32 {
    let filter = AllocationFilter::reserved_at(sku, location_id);
    allocations
        .iter()
        .filter(|a| filter.matches(a))
        .fold(0i32, |total, a| total.saturating_add(a.quantity))
}

/// Outcome of one row in a bulk allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRowResult {
    /// 1-based row number as submitted
    pub row: usize,
    pub sku: String,
    pub success: bool,
    pub message: String,
    pub allocation_id: Option<i64>,
}

/// Per-row results plus totals for a bulk allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAllocationResult {
    pub project_id: String,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkRowResult>,
}

impl BulkAllocationResult {
    pub fn from_rows(project_id: &str, results: Vec<BulkRowResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            project_id: project_id.to_string(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}
