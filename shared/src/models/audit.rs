//! Append-only audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::ParseStatusError;

/// Kind of quantity- or catalog-affecting action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    StockAdjustment,
    Transfer,
    Allocation,
    Pick,
    PhysicalCount,
    ItemCreated,
    ItemUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::StockAdjustment => "stock_adjustment",
            AuditAction::Transfer => "transfer",
            AuditAction::Allocation => "allocation",
            AuditAction::Pick => "pick",
            AuditAction::PhysicalCount => "physical_count",
            AuditAction::ItemCreated => "item_created",
            AuditAction::ItemUpdated => "item_updated",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::StockAdjustment => write!(f, "Stock Adjustment"),
            AuditAction::Transfer => write!(f, "Transfer"),
            AuditAction::Allocation => write!(f, "Allocation"),
            AuditAction::Pick => write!(f, "Pick"),
            AuditAction::PhysicalCount => write!(f, "Physical Count"),
            AuditAction::ItemCreated => write!(f, "Item Created"),
            AuditAction::ItemUpdated => write!(f, "Item Updated"),
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock_adjustment" => Ok(AuditAction::StockAdjustment),
            "transfer" => Ok(AuditAction::Transfer),
            "allocation" => Ok(AuditAction::Allocation),
            "pick" => Ok(AuditAction::Pick),
            "physical_count" => Ok(AuditAction::PhysicalCount),
            "item_created" => Ok(AuditAction::ItemCreated),
            "item_updated" => Ok(AuditAction::ItemUpdated),
            _ => Err(ParseStatusError::new("audit action", s)),
        }
    }
}

/// Immutable audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub sku: Option<String>,
    pub location_id: Option<String>,
    pub quantity_before: Option<i32>,
    pub quantity_after: Option<i32>,
    pub reason: String,
    pub notes: Option<String>,
}

/// Entry to append; the timestamp and id are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub actor: String,
    pub action: AuditAction,
    pub sku: Option<String>,
    pub location_id: Option<String>,
    pub quantity_before: Option<i32>,
    pub quantity_after: Option<i32>,
    pub reason: String,
    pub notes: Option<String>,
}

impl NewAuditEntry {
    pub fn new(actor: &str, action: AuditAction, reason: impl Into<String>) -> Self {
        Self {
            actor: actor.to_string(),
            action,
            sku: None,
            location_id: None,
            quantity_before: None,
            quantity_after: None,
            reason: reason.into(),
            notes: None,
        }
    }

    pub fn sku(mut self, sku: &str) -> Self {
        self.sku = Some(sku.to_string());
        self
    }

    pub fn location(mut self, location_id: &str) -> Self {
        self.location_id = Some(location_id.to_string());
        self
    }

    pub fn quantities(mut self, before: i32, after: i32) -> Self {
        self.quantity_before = Some(before);
        self.quantity_after = Some(after);
        self
    }

    pub fn notes(mut self, notes: Option<&str>) -> Self {
        self.notes = notes.map(str::to_string);
        self
    }
}

/// Audit log filter; newest entries first, at most `limit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub sku: Option<String>,
    pub location_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
}

impl AuditQuery {
    pub const DEFAULT_LIMIT: u32 = 200;

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.sku
            .as_ref()
            .map_or(true, |s| entry.sku.as_ref() == Some(s))
            && self
                .location_id
                .as_ref()
                .map_or(true, |l| entry.location_id.as_ref() == Some(l))
            && self.action.map_or(true, |a| a == entry.action)
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, 5000)
    }
}
