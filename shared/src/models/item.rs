//! Catalog items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Hub;
use crate::workflow::ParseStatusError;

/// A lumber SKU in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sku: String,
    pub description: String,
    pub category: Option<String>,
    pub species: Option<String>,
    pub dimensions: Option<String>,
    /// Reorder threshold summed over Farm storage; 0 means not tracked
    pub farm_par_level: i32,
    /// Reorder threshold summed over MKE storage; 0 means not tracked
    pub mke_par_level: i32,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn par_level(&self, hub: Hub) -> i32 {
        match hub {
            Hub::Farm => self.farm_par_level,
            Hub::Mke => self.mke_par_level,
            Hub::Transit => 0,
        }
    }
}

/// Catalog lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Discontinuing,
    Discontinued,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Discontinuing => "discontinuing",
            ItemStatus::Discontinued => "discontinued",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Active => write!(f, "Active"),
            ItemStatus::Discontinuing => write!(f, "Discontinuing"),
            ItemStatus::Discontinued => write!(f, "Discontinued"),
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ItemStatus::Active),
            "discontinuing" => Ok(ItemStatus::Discontinuing),
            "discontinued" => Ok(ItemStatus::Discontinued),
            _ => Err(ParseStatusError::new("item status", s)),
        }
    }
}

/// Input for creating a catalog item
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub description: String,
    pub category: Option<String>,
    pub species: Option<String>,
    pub dimensions: Option<String>,
    #[serde(default)]
    pub farm_par_level: i32,
    #[serde(default)]
    pub mke_par_level: i32,
    #[serde(default)]
    pub status: ItemStatus,
}

/// Partial update of a catalog item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    pub description: Option<String>,
    pub category: Option<String>,
    pub species: Option<String>,
    pub dimensions: Option<String>,
    pub farm_par_level: Option<i32>,
    pub mke_par_level: Option<i32>,
    pub status: Option<ItemStatus>,
}

impl ItemUpdate {
    /// Apply the update in place, returning the names of fields that changed
    pub fn apply_to(&self, item: &mut InventoryItem) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(description) = &self.description {
            if *description != item.description {
                item.description = description.clone();
                changed.push("description");
            }
        }
        if self.category.is_some() && self.category != item.category {
            item.category = self.category.clone();
            changed.push("category");
        }
        if self.species.is_some() && self.species != item.species {
            item.species = self.species.clone();
            changed.push("species");
        }
        if self.dimensions.is_some() && self.dimensions != item.dimensions {
            item.dimensions = self.dimensions.clone();
            changed.push("dimensions");
        }
        if let Some(par) = self.farm_par_level {
            if par != item.farm_par_level {
                item.farm_par_level = par;
                changed.push("farm_par_level");
            }
        }
        if let Some(par) = self.mke_par_level {
            if par != item.mke_par_level {
                item.mke_par_level = par;
                changed.push("mke_par_level");
            }
        }
        if let Some(status) = self.status {
            if status != item.status {
                item.status = status;
                changed.push("status");
            }
        }

        changed
    }
}
