//! Stock ledger
//!
//! `stock_levels` holds the on-hand quantity for every (SKU, location) pair and
//! is only ever written through [`set_quantity`]. The free functions here run
//! inside a caller's unit of work and never audit; [`LedgerService`] wraps them
//! into the stand-alone adjust and count operations, each with its audit entry.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    available_to_allocate, reserved_total, validate_location_id, validate_non_negative,
    validate_required, validate_sku, Actor, AllocationFilter, AllocationStatus, AuditAction,
    CountMeta, InventoryItem, ItemStock, Location, NewAuditEntry, StockLevel, StockPosition,
    TRANSIT_LOCATION_ID,
};

use crate::error::{AppError, AppResult};
use crate::services::audit;
use crate::store::{Store, UnitOfWork};

/// Quantity before and after one ledger write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    pub before: i32,
    pub after: i32,
}

/// On-hand quantity, 0 when no row exists
pub async fn get_quantity(uow: &mut dyn UnitOfWork, sku: &str, location_id: &str) -> AppResult<i32> {
    Ok(uow
        .get_stock_level(sku, location_id)
        .await?
        .map_or(0, |level| level.quantity))
}

/// Upsert the absolute quantity, optionally stamping count metadata
pub async fn set_quantity(
    uow: &mut dyn UnitOfWork,
    sku: &str,
    location_id: &str,
    new_quantity: i32,
    count: Option<&CountMeta>,
) -> AppResult<QuantityChange> {
    if new_quantity < 0 {
        return Err(AppError::InvalidState(format!(
            "Stock of {} at {} cannot go negative ({})",
            sku, location_id, new_quantity
        )));
    }

    let mut level = uow
        .get_stock_level(sku, location_id)
        .await?
        .unwrap_or_else(|| StockLevel::empty(sku, location_id));
    let before = level.quantity;

    level.quantity = new_quantity;
    level.updated_at = Utc::now();
    if let Some(count) = count {
        level.last_counted = Some(count.counted_on);
        level.counted_by = Some(count.counted_by.clone());
    }
    uow.upsert_stock_level(&level).await?;

    Ok(QuantityChange {
        before,
        after: new_quantity,
    })
}

/// Add a signed delta; fails before writing if the result would be negative
/// or would not fit in a quantity
pub async fn add_quantity(
    uow: &mut dyn UnitOfWork,
    sku: &str,
    location_id: &str,
    delta: i32,
) -> AppResult<QuantityChange> {
    let current = get_quantity(uow, sku, location_id).await?;
    let new_quantity = current.checked_add(delta).ok_or_else(|| {
        AppError::InvalidState(format!(
            "Adding {} to {} of {} at {} overflows the quantity",
            delta, current, sku, location_id
        ))
    })?;
    set_quantity(uow, sku, location_id, new_quantity, None).await
}

/// Remove up to `quantity`, stopping at zero
pub async fn remove_floored(
    uow: &mut dyn UnitOfWork,
    sku: &str,
    location_id: &str,
    quantity: i32,
) -> AppResult<QuantityChange> {
    let current = get_quantity(uow, sku, location_id).await?;
    set_quantity(uow, sku, location_id, (current - quantity).max(0), None).await
}

pub(crate) async fn require_item(uow: &mut dyn UnitOfWork, sku: &str) -> AppResult<InventoryItem> {
    uow.get_item(sku)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {}", sku)))
}

/// A location stock can be held at and moved between
pub(crate) async fn require_physical_location(
    uow: &mut dyn UnitOfWork,
    field: &str,
    location_id: &str,
) -> AppResult<Location> {
    let location = uow
        .get_location(location_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {}", location_id)))?;
    if !location.is_physical() {
        return Err(AppError::validation(
            field,
            format!("{} is a virtual location", location_id),
        ));
    }
    Ok(location)
}

/// Input for setting an absolute quantity
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockInput {
    pub sku: String,
    pub location_id: String,
    pub quantity: i32,
    pub reason: String,
    pub notes: Option<String>,
}

/// Input for recording a single physical count
#[derive(Debug, Clone, Deserialize)]
pub struct RecordCountInput {
    pub sku: String,
    pub location_id: String,
    pub counted_qty: i32,
    pub notes: Option<String>,
}

/// Result of an audited ledger write
#[derive(Debug, Clone, Serialize)]
pub struct StockChange {
    pub level: StockLevel,
    pub quantity_before: i32,
    pub audit_id: i64,
}

/// Stand-alone ledger operations
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Set the on-hand quantity directly, with a reason
    pub async fn adjust_stock(&self, actor: &Actor, input: AdjustStockInput) -> AppResult<StockChange> {
        validate_sku(&input.sku).map_err(|e| AppError::validation("sku", e))?;
        validate_location_id(&input.location_id)
            .map_err(|e| AppError::validation("location_id", e))?;
        validate_non_negative(input.quantity).map_err(|e| AppError::validation("quantity", e))?;
        validate_required(&input.reason).map_err(|e| AppError::validation("reason", e))?;

        let mut uow = self.store.begin().await?;
        require_item(uow.as_mut(), &input.sku).await?;
        require_physical_location(uow.as_mut(), "location_id", &input.location_id).await?;

        let change =
            set_quantity(uow.as_mut(), &input.sku, &input.location_id, input.quantity, None).await?;
        let entry = audit::record(
            uow.as_mut(),
            NewAuditEntry::new(&actor.email, AuditAction::StockAdjustment, input.reason.trim())
                .sku(&input.sku)
                .location(&input.location_id)
                .quantities(change.before, change.after)
                .notes(input.notes.as_deref()),
        )
        .await?;
        let level = self.level_in(uow.as_mut(), &input.sku, &input.location_id).await?;
        uow.commit().await?;

        tracing::info!(
            sku = %input.sku,
            location = %input.location_id,
            before = change.before,
            after = change.after,
            "Stock adjusted by {}",
            actor
        );

        Ok(StockChange {
            level,
            quantity_before: change.before,
            audit_id: entry.id,
        })
    }

    /// Overwrite the quantity with a physical count and stamp who counted it
    pub async fn record_count(&self, actor: &Actor, input: RecordCountInput) -> AppResult<StockChange> {
        validate_sku(&input.sku).map_err(|e| AppError::validation("sku", e))?;
        validate_location_id(&input.location_id)
            .map_err(|e| AppError::validation("location_id", e))?;
        validate_non_negative(input.counted_qty)
            .map_err(|e| AppError::validation("counted_qty", e))?;

        let mut uow = self.store.begin().await?;
        require_item(uow.as_mut(), &input.sku).await?;
        require_physical_location(uow.as_mut(), "location_id", &input.location_id).await?;

        let meta = CountMeta {
            counted_on: Utc::now().date_naive(),
            counted_by: actor.email.clone(),
        };
        let change = set_quantity(
            uow.as_mut(),
            &input.sku,
            &input.location_id,
            input.counted_qty,
            Some(&meta),
        )
        .await?;
        let entry = audit::record(
            uow.as_mut(),
            NewAuditEntry::new(&actor.email, AuditAction::PhysicalCount, "Physical count")
                .sku(&input.sku)
                .location(&input.location_id)
                .quantities(change.before, change.after)
                .notes(input.notes.as_deref()),
        )
        .await?;
        let level = self.level_in(uow.as_mut(), &input.sku, &input.location_id).await?;
        uow.commit().await?;

        if change.before != change.after {
            tracing::warn!(
                sku = %input.sku,
                location = %input.location_id,
                "Count differs from ledger by {}",
                change.after - change.before
            );
        }

        Ok(StockChange {
            level,
            quantity_before: change.before,
            audit_id: entry.id,
        })
    }

    /// Item with per-location on-hand, reserved and allocatable quantities
    pub async fn stock_for_item(&self, sku: &str) -> AppResult<ItemStock> {
        let mut uow = self.store.begin().await?;
        let item = require_item(uow.as_mut(), sku).await?;
        let locations = uow.list_locations().await?;
        let levels = uow.list_stock_levels(Some(sku)).await?;
        let reserved = uow
            .list_allocations(&AllocationFilter {
                sku: Some(sku.to_string()),
                status: Some(AllocationStatus::Reserved),
                ..Default::default()
            })
            .await?;

        let mut positions = Vec::with_capacity(levels.len());
        let mut total_on_hand: i32 = 0;
        let mut total_reserved: i32 = 0;
        let mut in_transit: i32 = 0;

        for level in &levels {
            let Some(location) = locations.iter().find(|l| l.location_id == level.location_id)
            else {
                continue;
            };
            let held = reserved_total(&reserved, sku, &level.location_id);
            if location.location_id == TRANSIT_LOCATION_ID {
                in_transit = level.quantity.saturating_add(in_transit);
            } else if location.is_physical() {
                total_on_hand = level.quantity.saturating_add(total_on_hand);
                total_reserved = held.saturating_add(total_reserved);
            }
            positions.push(StockPosition {
                location_id: location.location_id.clone(),
                location_name: location.name.clone(),
                hub: location.hub,
                quantity: level.quantity,
                reserved: held,
                available: available_to_allocate(level.quantity, held),
                last_counted: level.last_counted,
            });
        }

        Ok(ItemStock {
            item,
            positions,
            total_on_hand,
            total_reserved,
            in_transit,
        })
    }

    /// Raw ledger rows, optionally for one SKU
    pub async fn list_stock(&self, sku: Option<&str>) -> AppResult<Vec<StockLevel>> {
        let mut uow = self.store.begin().await?;
        uow.list_stock_levels(sku).await
    }

    async fn level_in(
        &self,
        uow: &mut dyn UnitOfWork,
        sku: &str,
        location_id: &str,
    ) -> AppResult<StockLevel> {
        uow.get_stock_level(sku, location_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Stock row {}/{} vanished", sku, location_id)))
    }
}
