//! WebAssembly module for the Lumber Inventory Platform
//!
//! Provides client-side previews for:
//! - Allocation availability
//! - Workflow button states (which transfer/pick actions are allowed)
//! - Below-par alerts
//! - Count sheet reconciliation before submission

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;
pub use shared::workflow::*;

fn js_error(message: String) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn parse_json<T: serde::de::DeserializeOwned>(label: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error(format!("Invalid {} JSON: {}", label, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error(format!("Serialization failed: {}", e)))
}

/// Stock that can still be reserved at a location
#[wasm_bindgen]
pub fn calculate_available(on_hand: i32, reserved: i32) -> i32 {
    available_to_allocate(on_hand, reserved)
}

/// Whether a reservation of `requested` would be accepted
#[wasm_bindgen]
pub fn can_allocate(on_hand: i32, reserved: i32, requested: i32) -> bool {
    requested > 0 && requested <= available_to_allocate(on_hand, reserved)
}

fn transfer_action(action: &str) -> Result<TransferAction, JsValue> {
    match action {
        "ship" => Ok(TransferAction::Ship),
        "receive" => Ok(TransferAction::Receive),
        "cancel" => Ok(TransferAction::Cancel),
        _ => Err(js_error(format!("Unknown transfer action: {}", action))),
    }
}

fn pick_action(action: &str) -> Result<PickAction, JsValue> {
    match action {
        "start" => Ok(PickAction::Start),
        "complete" => Ok(PickAction::Complete),
        "cancel" => Ok(PickAction::Cancel),
        _ => Err(js_error(format!("Unknown pick action: {}", action))),
    }
}

/// Whether a transfer in `status` (e.g. "in_transit") accepts `action` (e.g. "receive")
#[wasm_bindgen]
pub fn can_transfer_transition(status: &str, action: &str) -> Result<bool, JsValue> {
    let status: TransferStatus = status
        .parse()
        .map_err(|e: ParseStatusError| js_error(e.to_string()))?;
    Ok(status.can(transfer_action(action)?))
}

/// Whether a pick list in `status` accepts `action`
#[wasm_bindgen]
pub fn can_pick_transition(status: &str, action: &str) -> Result<bool, JsValue> {
    let status: PickStatus = status
        .parse()
        .map_err(|e: ParseStatusError| js_error(e.to_string()))?;
    Ok(status.can(pick_action(action)?))
}

/// Below-par alerts computed from item, location and stock JSON arrays
#[wasm_bindgen]
pub fn preview_below_par(
    items_json: &str,
    locations_json: &str,
    stock_json: &str,
) -> Result<String, JsValue> {
    let items: Vec<InventoryItem> = parse_json("items", items_json)?;
    let locations: Vec<Location> = parse_json("locations", locations_json)?;
    let stock: Vec<StockLevel> = parse_json("stock", stock_json)?;
    to_json(&below_par_alerts(&items, &locations, &stock))
}

/// Validate a count sheet and return its reconciliation lines as JSON
#[wasm_bindgen]
pub fn preview_reconciliation(items_json: &str) -> Result<String, JsValue> {
    let items: Vec<CountedItem> = parse_json("count sheet", items_json)?;
    validate_count_sheet(&items)
        .map_err(|(field, msg)| js_error(format!("{}: {}", field, msg)))?;
    to_json(&reconcile(&items))
}

/// Validate a SKU as typed into a form; returns the problem, or an empty string
#[wasm_bindgen]
pub fn check_sku(sku: &str) -> String {
    validate_sku(sku).err().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_preview() {
        assert_eq!(calculate_available(100, 90), 10);
        assert!(can_allocate(100, 0, 90));
        assert!(!can_allocate(100, 90, 20));
        assert!(!can_allocate(100, 0, 0));
    }

    #[test]
    fn test_transfer_transitions() {
        assert!(can_transfer_transition("requested", "ship").unwrap());
        assert!(can_transfer_transition("in_transit", "cancel").unwrap());
        assert!(!can_transfer_transition("received", "cancel").unwrap());
    }

    #[test]
    fn test_pick_transitions() {
        assert!(can_pick_transition("pending", "start").unwrap());
        assert!(can_pick_transition("in_progress", "complete").unwrap());
        assert!(!can_pick_transition("completed", "cancel").unwrap());
    }

    #[test]
    fn test_reconciliation_preview() {
        let json = r#"[{"sku":"CDR-2x6x12","system_qty":10,"counted_qty":8}]"#;
        let lines: Vec<ReconciliationLine> =
            serde_json::from_str(&preview_reconciliation(json).unwrap()).unwrap();
        assert_eq!(lines[0].difference, -2);
    }

    #[test]
    fn test_check_sku() {
        assert_eq!(check_sku("CDR-2x6x12"), "");
        assert_eq!(check_sku("CDR 2x6"), "SKU cannot contain whitespace");
    }
}
