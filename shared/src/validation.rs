//! Validation utilities for the Lumber Inventory Platform

use crate::models::{CountedItem, ItemUpdate, NewItem};

/// Maximum length of SKU and location identifiers
pub const MAX_KEY_LENGTH: usize = 64;

// ============================================================================
// Identifier Validations
// ============================================================================

/// Validate a SKU: non-empty, no whitespace, at most 64 characters
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() {
        return Err("SKU is required");
    }
    if sku.len() > MAX_KEY_LENGTH {
        return Err("SKU must be at most 64 characters");
    }
    if sku.chars().any(char::is_whitespace) {
        return Err("SKU cannot contain whitespace");
    }
    Ok(())
}

/// Validate a location id (uppercase alphanumeric with dashes)
pub fn validate_location_id(location_id: &str) -> Result<(), &'static str> {
    if location_id.is_empty() {
        return Err("Location is required");
    }
    if location_id.len() > MAX_KEY_LENGTH {
        return Err("Location must be at most 64 characters");
    }
    if !location_id
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Location must be uppercase alphanumeric with dashes");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

// ============================================================================
// Quantity Validations
// ============================================================================

/// Quantities moved, reserved or picked must be at least 1
pub fn validate_positive_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive whole number");
    }
    Ok(())
}

/// Counts, absolute stock levels and par levels may be zero but never negative
pub fn validate_non_negative(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Required free-text field (reason, name, client...)
pub fn validate_required(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("This field is required");
    }
    Ok(())
}

// ============================================================================
// Composite Validations
// ============================================================================

/// Validate a new catalog item, returning the offending field on failure
pub fn validate_new_item(item: &NewItem) -> Result<(), (&'static str, &'static str)> {
    validate_sku(&item.sku).map_err(|e| ("sku", e))?;
    validate_required(&item.description).map_err(|e| ("description", e))?;
    validate_non_negative(item.farm_par_level).map_err(|e| ("farm_par_level", e))?;
    validate_non_negative(item.mke_par_level).map_err(|e| ("mke_par_level", e))?;
    Ok(())
}

/// Validate a partial item update
pub fn validate_item_update(update: &ItemUpdate) -> Result<(), (&'static str, &'static str)> {
    if let Some(description) = &update.description {
        validate_required(description).map_err(|e| ("description", e))?;
    }
    if let Some(par) = update.farm_par_level {
        validate_non_negative(par).map_err(|e| ("farm_par_level", e))?;
    }
    if let Some(par) = update.mke_par_level {
        validate_non_negative(par).map_err(|e| ("mke_par_level", e))?;
    }
    Ok(())
}

/// Validate count sheet rows: SKUs well-formed and unique, quantities non-negative
pub fn validate_count_sheet(items: &[CountedItem]) -> Result<(), (&'static str, String)> {
    if items.is_empty() {
        return Err(("items", "At least one counted item is required".to_string()));
    }
    let mut seen = std::collections::HashSet::new();
    for item in items {
        validate_sku(&item.sku).map_err(|e| ("sku", format!("{}: {}", item.sku, e)))?;
        validate_non_negative(item.system_qty)
            .map_err(|e| ("system_qty", format!("{}: {}", item.sku, e)))?;
        validate_non_negative(item.counted_qty)
            .map_err(|e| ("counted_qty", format!("{}: {}", item.sku, e)))?;
        if !seen.insert(item.sku.as_str()) {
            return Err(("sku", format!("{}: counted more than once", item.sku)));
        }
    }
    Ok(())
}
