//! Stock ledger tests
//!
//! Tests for:
//! - Direct adjustments and physical counts
//! - Per-item stock views with reservations and Transit
//! - Audit completeness for every ledger write
//! - Non-negativity across arbitrary operation sequences

mod common;

use common::*;
use lumber_inventory::services::ledger::{AdjustStockInput, RecordCountInput};
use lumber_inventory::services::picking::ConfirmPickInput;
use lumber_inventory::services::transfers::ReceiveTransferInput;
use lumber_inventory::AppError;
use proptest::prelude::*;
use shared::{AllocationRequest, AuditAction, AuditQuery, NewTransfer};

fn adjustment(location_id: &str, quantity: i32) -> AdjustStockInput {
    AdjustStockInput {
        sku: SKU.to_string(),
        location_id: location_id.to_string(),
        quantity,
        reason: "Delivery from mill".to_string(),
        notes: None,
    }
}

// ============================================================================
// Adjustment Tests
// ============================================================================

#[tokio::test]
async fn test_adjust_records_before_and_after() {
    let yard = Yard::with_cedar().await;

    let change = yard
        .ledger()
        .adjust_stock(&yard.actor, adjustment(FARM_WS, 140))
        .await
        .unwrap();

    assert_eq!(change.quantity_before, 100);
    assert_eq!(change.level.quantity, 140);

    let latest = &yard.audit_entries().await[0];
    assert_eq!(latest.id, change.audit_id);
    assert_eq!(latest.action, AuditAction::StockAdjustment);
    assert_eq!(latest.reason, "Delivery from mill");
    assert_eq!(latest.quantity_before, Some(100));
    assert_eq!(latest.quantity_after, Some(140));
}

#[tokio::test]
async fn test_adjust_rejections_leave_no_trace() {
    let yard = Yard::with_cedar().await;
    let ledger = yard.ledger();
    let before = yard.audit_count().await;

    assert!(matches!(
        ledger.adjust_stock(&yard.actor, adjustment(FARM_WS, -1)).await,
        Err(AppError::Validation { .. })
    ));
    assert!(matches!(
        ledger
            .adjust_stock(
                &yard.actor,
                AdjustStockInput {
                    reason: "   ".to_string(),
                    ..adjustment(FARM_WS, 5)
                }
            )
            .await,
        Err(AppError::Validation { .. })
    ));
    assert!(matches!(
        ledger.adjust_stock(&yard.actor, adjustment(TRANSIT, 5)).await,
        Err(AppError::Validation { .. })
    ));
    assert!(matches!(
        ledger.adjust_stock(&yard.actor, adjustment("NOWHERE", 5)).await,
        Err(AppError::NotFound(_))
    ));

    assert_eq!(yard.quantity(SKU, FARM_WS).await, 100);
    assert_eq!(yard.audit_count().await, before);
}

#[tokio::test]
async fn test_record_count_stamps_counter() {
    let yard = Yard::with_cedar().await;

    let change = yard
        .ledger()
        .record_count(
            &yard.actor,
            RecordCountInput {
                sku: SKU.to_string(),
                location_id: FARM_WS.to_string(),
                counted_qty: 96,
                notes: Some("Two boards split".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(change.quantity_before, 100);
    assert_eq!(change.level.quantity, 96);
    assert_eq!(change.level.counted_by.as_deref(), Some("yard@example.com"));
    assert!(change.level.last_counted.is_some());
    assert_eq!(
        yard.audit_entries().await[0].action,
        AuditAction::PhysicalCount
    );
}

// ============================================================================
// Stock View Tests
// ============================================================================

#[tokio::test]
async fn test_item_stock_splits_physical_and_transit() {
    let yard = Yard::with_cedar().await;
    yard.set_stock(SKU, MKE_SHOP, 15).await;
    let project = yard.project("Lakeside Deck").await;
    yard.allocations()
        .allocate(
            &yard.actor,
            &project.project_id,
            &AllocationRequest {
                sku: SKU.to_string(),
                source_location: FARM_WS.to_string(),
                quantity: 25,
            },
        )
        .await
        .unwrap();

    let transfers = yard.transfers();
    let transfer = transfers
        .create(
            &yard.actor,
            NewTransfer {
                sku: SKU.to_string(),
                quantity: 10,
                from_location: FARM_WS.to_string(),
                to_location: MKE_SHOP.to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();
    transfers.ship(&yard.actor, transfer.id).await.unwrap();

    let stock = yard.ledger().stock_for_item(SKU).await.unwrap();
    assert_eq!(stock.total_on_hand, 105);
    assert_eq!(stock.total_reserved, 25);
    assert_eq!(stock.in_transit, 10);

    let shed = stock
        .positions
        .iter()
        .find(|p| p.location_id == FARM_WS)
        .unwrap();
    assert_eq!(shed.quantity, 90);
    assert_eq!(shed.available, 65);
}

#[tokio::test]
async fn test_list_stock_by_sku() {
    let yard = Yard::with_cedar().await;
    yard.add_item("OAK-1x4x8", 0).await;
    yard.set_stock("OAK-1x4x8", MKE_SHOP, 7).await;

    let ledger = yard.ledger();
    assert_eq!(ledger.list_stock(None).await.unwrap().len(), 2);
    let oak = ledger.list_stock(Some("OAK-1x4x8")).await.unwrap();
    assert_eq!(oak.len(), 1);
    assert_eq!(oak[0].quantity, 7);
}

#[tokio::test]
async fn test_audit_filters() {
    let yard = Yard::with_cedar().await;
    yard.set_stock(SKU, MKE_SHOP, 3).await;

    let at_mke = yard
        .audit()
        .list(&AuditQuery {
            location_id: Some(MKE_SHOP.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(at_mke.len(), 1);

    let limited = yard
        .audit()
        .list(&AuditQuery {
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].location_id.as_deref(), Some(MKE_SHOP));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Adjust(i32),
    Request(i32),
    Ship,
    Receive(i32),
    Cancel,
    Reserve(i32),
    Pick(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i32..120).prop_map(Op::Adjust),
        (-5i32..120).prop_map(Op::Request),
        Just(Op::Ship),
        (-5i32..60).prop_map(Op::Receive),
        Just(Op::Cancel),
        (-5i32..80).prop_map(Op::Reserve),
        (-5i32..80).prop_map(Op::Pick),
    ]
}

/// Apply one operation; returns whether it succeeded
async fn apply(yard: &Yard, project_id: &str, op: &Op) -> bool {
    let actor = &yard.actor;
    let last_transfer = yard
        .transfers()
        .list(None)
        .await
        .unwrap()
        .first()
        .map(|t| t.id);
    match op {
        Op::Adjust(quantity) => yard
            .ledger()
            .adjust_stock(actor, adjustment(FARM_WS, *quantity))
            .await
            .is_ok(),
        Op::Request(quantity) => yard
            .transfers()
            .create(
                actor,
                NewTransfer {
                    sku: SKU.to_string(),
                    quantity: *quantity,
                    from_location: FARM_WS.to_string(),
                    to_location: MKE_SHOP.to_string(),
                    notes: None,
                },
            )
            .await
            .is_ok(),
        Op::Ship => match last_transfer {
            Some(id) => yard.transfers().ship(actor, id).await.is_ok(),
            None => false,
        },
        Op::Receive(quantity) => match last_transfer {
            Some(id) => yard
                .transfers()
                .receive(
                    actor,
                    id,
                    ReceiveTransferInput {
                        quantity_received: Some(*quantity),
                    },
                )
                .await
                .is_ok(),
            None => false,
        },
        Op::Cancel => match last_transfer {
            Some(id) => yard.transfers().cancel(actor, id).await.is_ok(),
            None => false,
        },
        Op::Reserve(quantity) => yard
            .allocations()
            .allocate(
                actor,
                project_id,
                &AllocationRequest {
                    sku: SKU.to_string(),
                    source_location: FARM_WS.to_string(),
                    quantity: *quantity,
                },
            )
            .await
            .is_ok(),
        Op::Pick(quantity) => {
            let picking = yard.picking();
            let _ = picking.generate(actor, project_id).await;
            let open = picking
                .list(Some(project_id))
                .await
                .unwrap()
                .into_iter()
                .find(|p| p.is_open());
            match open {
                Some(pick) => picking
                    .confirm_pick(
                        actor,
                        pick.id,
                        ConfirmPickInput {
                            quantity_picked: *quantity,
                        },
                    )
                    .await
                    .is_ok(),
                None => false,
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// No sequence of operations drives any location negative, and each
    /// successful operation appends exactly one audit entry
    #[test]
    fn prop_ledger_never_negative(ops in prop::collection::vec(op_strategy(), 1..25)) {
        let violations = tokio_test::block_on(async {
            let yard = Yard::with_cedar().await;
            let project = yard.project("Prop Build").await;
            let mut violations = Vec::new();

            for op in &ops {
                let before = yard.audit_count().await;
                let succeeded = apply(&yard, &project.project_id, op).await;
                let written = yard.audit_count().await - before;
                let expected = usize::from(succeeded);
                if written != expected {
                    violations.push(format!("{:?} wrote {} audit entries", op, written));
                }

                for level in yard.ledger().list_stock(None).await.unwrap() {
                    if level.quantity < 0 {
                        violations.push(format!(
                            "{:?} left {} at {}",
                            op, level.quantity, level.location_id
                        ));
                    }
                }
            }
            violations
        });

        prop_assert!(violations.is_empty(), "{:?}", violations);
    }
}
