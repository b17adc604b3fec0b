//! Below-par alerts

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Hub, InventoryItem, Location, StockLevel};

/// A hub whose physical stock of a SKU has fallen below its par level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParAlert {
    pub sku: String,
    pub description: String,
    pub hub: Hub,
    pub current_total: i32,
    pub par_level: i32,
    pub deficit: i32,
}

/// Compare per-hub physical totals against par levels
///
/// Only storage zones count toward a hub's total; Transit and any other
/// virtual zone are ignored. A par level of 0 means the SKU is not tracked
/// for that hub. Results are ordered by deficit, largest first.
pub fn below_par_alerts(
    items: &[InventoryItem],
    locations: &[Location],
    stock: &[StockLevel],
) -> Vec<ParAlert> {
    let hub_of: HashMap<&str, Hub> = locations
        .iter()
        .filter(|l| l.is_physical())
        .map(|l| (l.location_id.as_str(), l.hub))
        .collect();

    let mut totals: HashMap<(&str, Hub), i32> = HashMap::new();
    for level in stock {
        if let Some(hub) = hub_of.get(level.location_id.as_str()) {
            let total = totals.entry((level.sku.as_str(), *hub)).or_insert(0);
            *total = total.saturating_add(level.quantity);
        }
    }

    let mut alerts: Vec<ParAlert> = items
        .iter()
        .flat_map(|item| {
            Hub::PHYSICAL.into_iter().filter_map(|hub| {
                let par_level = item.par_level(hub);
                if par_level <= 0 {
                    return None;
                }
                let current_total = totals.get(&(item.sku.as_str(), hub)).copied().unwrap_or(0);
                (current_total < par_level).then(|| ParAlert {
                    sku: item.sku.clone(),
                    description: item.description.clone(),
                    hub,
                    current_total,
                    par_level,
                    deficit: par_level - current_total,
                })
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.deficit
            .cmp(&a.deficit)
            .then_with(|| a.sku.cmp(&b.sku))
            .then_with(|| a.hub.cmp(&b.hub))
    });
    alerts
}
