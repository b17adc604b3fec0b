//! Common types used across the platform

use serde::{Deserialize, Serialize};

use crate::models::{InventoryItem, StockPosition};

/// The already-verified identity performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub email: String,
}

impl Actor {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.email)
    }
}

/// Catalog item with its stock at every location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStock {
    pub item: InventoryItem,
    pub positions: Vec<StockPosition>,
    pub total_on_hand: i32,
    pub total_reserved: i32,
    /// Quantity currently in the Transit zone
    pub in_transit: i32,
}
