//! Reconciliation and par level tests
//!
//! Tests for:
//! - Recording count sheets as observational reports
//! - Writing counts back to the ledger on request
//! - Counting only at physical locations
//! - Below-par alerts over live stock
//! - CSV export of reports

mod common;

use common::*;
use lumber_inventory::services::reconciliation::SubmitCountInput;
use lumber_inventory::services::ReportingService;
use lumber_inventory::AppError;
use shared::{AuditAction, CountedItem, Hub, NewTransfer};

fn count_sheet(system_qty: i32, counted_qty: i32, apply_counts: bool) -> SubmitCountInput {
    SubmitCountInput {
        location_id: FARM_WS.to_string(),
        items: vec![CountedItem {
            sku: SKU.to_string(),
            system_qty,
            counted_qty,
        }],
        notes: Some("Monthly count".to_string()),
        apply_counts,
    }
}

// ============================================================================
// Count Sheet Tests
// ============================================================================

#[tokio::test]
async fn test_count_reports_discrepancy() {
    let yard = Yard::with_cedar().await;

    let report = yard
        .reconciliation()
        .submit(&yard.actor, count_sheet(10, 8, false))
        .await
        .unwrap();

    assert_eq!(report.discrepancy_count, 1);
    assert_eq!(report.lines[0].difference, -2);
    assert!(!report.applied);
    assert_eq!(report.submitted_by, "yard@example.com");

    // observational only
    assert_eq!(yard.quantity(SKU, FARM_WS).await, 100);
    let fetched = yard.reconciliation().get(report.id).await.unwrap();
    assert_eq!(fetched, report);
}

#[tokio::test]
async fn test_applied_count_overwrites_ledger() {
    let yard = Yard::with_cedar().await;
    let before = yard.audit_count().await;

    let report = yard
        .reconciliation()
        .submit(&yard.actor, count_sheet(100, 97, true))
        .await
        .unwrap();

    assert!(report.applied);
    assert_eq!(yard.quantity(SKU, FARM_WS).await, 97);

    let entries = yard.audit_entries().await;
    assert_eq!(entries.len(), before + 2);
    assert_eq!(entries[0].action, AuditAction::PhysicalCount);
    assert_eq!(entries[0].quantity_before, Some(100));
    assert_eq!(entries[0].quantity_after, Some(97));

    let stock = yard.ledger().stock_for_item(SKU).await.unwrap();
    let shed = stock
        .positions
        .iter()
        .find(|p| p.location_id == FARM_WS)
        .unwrap();
    assert!(shed.last_counted.is_some());
}

#[tokio::test]
async fn test_matching_count_changes_nothing() {
    let yard = Yard::with_cedar().await;
    let report = yard
        .reconciliation()
        .submit(&yard.actor, count_sheet(100, 100, true))
        .await
        .unwrap();

    assert_eq!(report.discrepancy_count, 0);
    assert_eq!(yard.quantity(SKU, FARM_WS).await, 100);
}

#[tokio::test]
async fn test_applied_count_uses_ledger_not_stale_sheet() {
    let yard = Yard::with_cedar().await;
    yard.set_stock(SKU, FARM_WS, 12).await;

    // sheet printed when the ledger still said 10
    let report = yard
        .reconciliation()
        .submit(&yard.actor, count_sheet(10, 10, true))
        .await
        .unwrap();

    assert_eq!(report.discrepancy_count, 0);
    assert_eq!(yard.quantity(SKU, FARM_WS).await, 10);
    let entries = yard.audit_entries().await;
    assert_eq!(entries[0].quantity_before, Some(12));
    assert_eq!(entries[0].quantity_after, Some(10));
}

#[tokio::test]
async fn test_count_at_transit_rejected() {
    let yard = Yard::with_cedar().await;
    let transfers = yard.transfers();
    let transfer = transfers
        .create(
            &yard.actor,
            NewTransfer {
                sku: SKU.to_string(),
                quantity: 5,
                from_location: FARM_WS.to_string(),
                to_location: MKE_SHOP.to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    transfers.ship(&yard.actor, transfer.id).await.unwrap();

    let err = yard
        .reconciliation()
        .submit(
            &yard.actor,
            SubmitCountInput {
                location_id: TRANSIT.to_string(),
                ..count_sheet(5, 0, true)
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(yard.quantity(SKU, TRANSIT).await, 5);
    assert!(yard.reconciliation().list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_count_sheet_validation() {
    let yard = Yard::with_cedar().await;
    let reconciliation = yard.reconciliation();

    let empty = SubmitCountInput {
        items: Vec::new(),
        ..count_sheet(0, 0, false)
    };
    assert!(matches!(
        reconciliation.submit(&yard.actor, empty).await,
        Err(AppError::Validation { .. })
    ));

    let unknown = SubmitCountInput {
        items: vec![CountedItem {
            sku: "NOPE-1".to_string(),
            system_qty: 1,
            counted_qty: 1,
        }],
        ..count_sheet(0, 0, false)
    };
    assert!(matches!(
        reconciliation.submit(&yard.actor, unknown).await,
        Err(AppError::NotFound(_))
    ));
    assert!(reconciliation.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_listed_by_location() {
    let yard = Yard::with_cedar().await;
    yard.set_stock(SKU, MKE_SHOP, 5).await;
    let reconciliation = yard.reconciliation();

    reconciliation
        .submit(&yard.actor, count_sheet(100, 100, false))
        .await
        .unwrap();
    reconciliation
        .submit(
            &yard.actor,
            SubmitCountInput {
                location_id: MKE_SHOP.to_string(),
                ..count_sheet(5, 4, false)
            },
        )
        .await
        .unwrap();

    assert_eq!(reconciliation.list(None).await.unwrap().len(), 2);
    let mke = reconciliation.list(Some(MKE_SHOP)).await.unwrap();
    assert_eq!(mke.len(), 1);
    assert_eq!(mke[0].discrepancy_count, 1);
}

#[tokio::test]
async fn test_submission_notifies() {
    let yard = Yard::with_cedar().await;
    yard.reconciliation()
        .submit(&yard.actor, count_sheet(10, 8, false))
        .await
        .unwrap();
    yard.settle().await;

    assert_eq!(yard.notifier.subjects.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_report_csv_has_one_row_per_line() {
    let yard = Yard::with_cedar().await;
    let report = yard
        .reconciliation()
        .submit(&yard.actor, count_sheet(10, 8, false))
        .await
        .unwrap();

    let csv = ReportingService::reconciliation_csv(&[report]).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("CDR-2x6x12"));
}

// ============================================================================
// Par Level Tests
// ============================================================================

#[tokio::test]
async fn test_below_par_over_live_stock() {
    let yard = Yard::new().await;
    yard.add_item(SKU, 50).await;
    yard.add_item("OAK-1x4x8", 0).await;
    yard.set_stock(SKU, FARM_WS, 20).await;
    yard.set_stock(SKU, FARM_LOFT, 10).await;

    let alerts = yard.reconciliation().below_par_alerts().await.unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].sku, SKU);
    assert_eq!(alerts[0].hub, Hub::Farm);
    assert_eq!(alerts[0].deficit, 20);
}

#[tokio::test]
async fn test_shipping_can_drop_a_hub_below_par() {
    let yard = Yard::with_cedar().await;
    assert!(yard
        .reconciliation()
        .below_par_alerts()
        .await
        .unwrap()
        .is_empty());

    let transfers = yard.transfers();
    let transfer = transfers
        .create(
            &yard.actor,
            NewTransfer {
                sku: SKU.to_string(),
                quantity: 70,
                from_location: FARM_WS.to_string(),
                to_location: MKE_SHOP.to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    transfers.ship(&yard.actor, transfer.id).await.unwrap();

    // stock in Transit does not count toward the Farm
    let alerts = yard.reconciliation().below_par_alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].current_total, 30);
    assert_eq!(alerts[0].deficit, 20);
}
