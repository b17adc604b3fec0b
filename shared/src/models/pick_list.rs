//! Pick tasks generated from reservations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Allocation;
use crate::workflow::{ParseStatusError, StateMachine};

/// One concrete pull of stock for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickList {
    pub id: i64,
    pub project_id: String,
    /// Reservation this task was generated from
    pub allocation_id: Option<i64>,
    pub sku: String,
    pub quantity_requested: i32,
    pub pick_from_location: String,
    pub quantity_picked: i32,
    pub status: PickStatus,
    pub picked_by: Option<String>,
    pub pick_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PickList {
    pub fn is_open(&self) -> bool {
        matches!(self.status, PickStatus::Pending | PickStatus::InProgress)
    }
}

/// ```text
/// Pending --start--> In Progress
/// Pending | In Progress --complete--> Completed
/// Pending | In Progress --cancel--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickAction {
    Start,
    Complete,
    Cancel,
}

impl std::fmt::Display for PickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickAction::Start => write!(f, "start"),
            PickAction::Complete => write!(f, "complete"),
            PickAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl StateMachine for PickStatus {
    type Action = PickAction;
    const ENTITY: &'static str = "pick list";

    fn next(self, action: PickAction) -> Option<Self> {
        use PickStatus::*;
        match (self, action) {
            (Pending, PickAction::Start) => Some(InProgress),
            (Pending | InProgress, PickAction::Complete) => Some(Completed),
            (Pending | InProgress, PickAction::Cancel) => Some(Cancelled),
            _ => None,
        }
    }
}

impl PickStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickStatus::Pending => "pending",
            PickStatus::InProgress => "in_progress",
            PickStatus::Completed => "completed",
            PickStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PickStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickStatus::Pending => write!(f, "Pending"),
            PickStatus::InProgress => write!(f, "In Progress"),
            PickStatus::Completed => write!(f, "Completed"),
            PickStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for PickStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PickStatus::Pending),
            "in_progress" => Ok(PickStatus::InProgress),
            "completed" => Ok(PickStatus::Completed),
            "cancelled" => Ok(PickStatus::Cancelled),
            _ => Err(ParseStatusError::new("pick status", s)),
        }
    }
}

/// Row to insert for a generated pick task
#[derive(Debug, Clone)]
pub struct NewPickList {
    pub project_id: String,
    pub allocation_id: Option<i64>,
    pub sku: String,
    pub quantity_requested: i32,
    pub pick_from_location: String,
}

impl From<&Allocation> for NewPickList {
    fn from(allocation: &Allocation) -> Self {
        Self {
            project_id: allocation.project_id.clone(),
            allocation_id: Some(allocation.id),
            sku: allocation.sku.clone(),
            quantity_requested: allocation.quantity,
            pick_from_location: allocation.source_location.clone(),
        }
    }
}
