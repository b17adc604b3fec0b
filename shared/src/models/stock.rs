//! Stock ledger rows

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Hub;

/// Quantity of one SKU at one location; the single source of truth for on-hand stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub sku: String,
    pub location_id: String,
    pub quantity: i32,
    pub last_counted: Option<NaiveDate>,
    pub counted_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StockLevel {
    pub fn empty(sku: &str, location_id: &str) -> Self {
        Self {
            sku: sku.to_string(),
            location_id: location_id.to_string(),
            quantity: 0,
            last_counted: None,
            counted_by: None,
            updated_at: Utc::now(),
        }
    }
}

/// Physical count metadata stamped on a stock row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMeta {
    pub counted_on: NaiveDate,
    pub counted_by: String,
}

/// On-hand, reserved and allocatable quantity of a SKU at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    pub location_id: String,
    pub location_name: String,
    pub hub: Hub,
    pub quantity: i32,
    pub reserved: i32,
    pub available: i32,
    pub last_counted: Option<NaiveDate>,
}

/// Stock that can still be reserved: on-hand minus open reservations, never negative
pub fn available_to_allocate(on_hand: i32, reserved: i32) -> i32 {
    (on_hand - reserved).max(0)
}
