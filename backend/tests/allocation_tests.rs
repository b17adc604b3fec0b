//! Allocation tests
//!
//! Tests for:
//! - Reserving against on-hand minus open reservations
//! - Bulk allocation with per-row results
//! - Releasing reservations
//! - Availability never going negative

mod common;

use common::*;
use lumber_inventory::AppError;
use proptest::prelude::*;
use shared::{AllocationFilter, AllocationRequest, AllocationStatus, AuditAction};

fn request(quantity: i32) -> AllocationRequest {
    AllocationRequest {
        sku: SKU.to_string(),
        source_location: FARM_WS.to_string(),
        quantity,
    }
}

// ============================================================================
// Single Allocation Tests
// ============================================================================

#[tokio::test]
async fn test_second_allocation_sees_the_first() {
    let yard = Yard::with_cedar().await;
    let project = yard.project("Lakeside Deck").await;
    assert_eq!(project.project_id, "PRJ-001");
    let allocations = yard.allocations();

    let first = allocations
        .allocate(&yard.actor, &project.project_id, &request(90))
        .await
        .unwrap();
    assert_eq!(first.status, AllocationStatus::Reserved);
    assert_eq!(first.allocated_by, "yard@example.com");

    let err = allocations
        .allocate(&yard.actor, &project.project_id, &request(20))
        .await
        .unwrap_err();
    match err {
        AppError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 10);
            assert_eq!(requested, 20);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    // reserving does not touch the ledger
    assert_eq!(yard.quantity(SKU, FARM_WS).await, 100);
    let availability = allocations.available(SKU, FARM_WS).await.unwrap();
    assert_eq!(availability.on_hand, 100);
    assert_eq!(availability.reserved, 90);
    assert_eq!(availability.available, 10);
}

#[tokio::test]
async fn test_allocation_is_audited_without_quantities() {
    let yard = Yard::with_cedar().await;
    let project = yard.project("Lakeside Deck").await;
    let before = yard.audit_count().await;

    yard.allocations()
        .allocate(&yard.actor, &project.project_id, &request(30))
        .await
        .unwrap();

    let entries = yard.audit_entries().await;
    assert_eq!(entries.len(), before + 1);
    assert_eq!(entries[0].action, AuditAction::Allocation);
    assert_eq!(entries[0].sku.as_deref(), Some(SKU));
    assert!(entries[0].quantity_before.is_none());
}

#[tokio::test]
async fn test_unknown_project_and_virtual_source() {
    let yard = Yard::with_cedar().await;
    let allocations = yard.allocations();

    assert!(matches!(
        allocations.allocate(&yard.actor, "PRJ-404", &request(1)).await,
        Err(AppError::NotFound(_))
    ));

    let project = yard.project("Lakeside Deck").await;
    let from_transit = AllocationRequest {
        source_location: TRANSIT.to_string(),
        ..request(1)
    };
    assert!(matches!(
        allocations
            .allocate(&yard.actor, &project.project_id, &from_transit)
            .await,
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_zero_quantity_rejected() {
    let yard = Yard::with_cedar().await;
    let project = yard.project("Lakeside Deck").await;
    assert!(matches!(
        yard.allocations()
            .allocate(&yard.actor, &project.project_id, &request(0))
            .await,
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_cancel_frees_availability() {
    let yard = Yard::with_cedar().await;
    let project = yard.project("Lakeside Deck").await;
    let allocations = yard.allocations();

    let allocation = allocations
        .allocate(&yard.actor, &project.project_id, &request(90))
        .await
        .unwrap();
    let cancelled = allocations.cancel(&yard.actor, allocation.id).await.unwrap();
    assert_eq!(cancelled.status, AllocationStatus::Cancelled);
    assert_eq!(allocations.available(SKU, FARM_WS).await.unwrap().available, 100);

    // a cancelled reservation cannot be cancelled again
    assert!(matches!(
        allocations.cancel(&yard.actor, allocation.id).await,
        Err(AppError::InvalidState(_))
    ));

    allocations
        .allocate(&yard.actor, &project.project_id, &request(100))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stock_adjusted_below_reservations() {
    let yard = Yard::with_cedar().await;
    let project = yard.project("Lakeside Deck").await;
    let allocations = yard.allocations();

    allocations
        .allocate(&yard.actor, &project.project_id, &request(90))
        .await
        .unwrap();
    yard.set_stock(SKU, FARM_WS, 40).await;

    let availability = allocations.available(SKU, FARM_WS).await.unwrap();
    assert_eq!(availability.available, 0);
    assert!(allocations
        .allocate(&yard.actor, &project.project_id, &request(1))
        .await
        .is_err());
}

// ============================================================================
// Bulk Allocation Tests
// ============================================================================

#[tokio::test]
async fn test_bulk_rows_succeed_or_fail_independently() {
    let yard = Yard::with_cedar().await;
    let project = yard.project("Lakeside Deck").await;

    let rows = vec![
        request(60),
        request(50),
        AllocationRequest {
            sku: "NOPE-1".to_string(),
            ..request(1)
        },
        request(40),
    ];
    let result = yard
        .allocations()
        .bulk_allocate(&yard.actor, &project.project_id, &rows)
        .await
        .unwrap();

    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 2);
    let outcomes: Vec<bool> = result.results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![true, false, false, true]);
    assert_eq!(result.results[0].row, 1);
    assert!(result.results[0].allocation_id.is_some());
    assert!(result.results[1].message.contains("Insufficient stock"));

    let reserved = yard
        .allocations()
        .list(&AllocationFilter {
            project_id: Some(project.project_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(reserved.iter().map(|a| a.quantity).sum::<i32>(), 100);
}

#[tokio::test]
async fn test_bulk_requires_project() {
    let yard = Yard::with_cedar().await;
    assert!(matches!(
        yard.allocations()
            .bulk_allocate(&yard.actor, "PRJ-404", &[request(1)])
            .await,
        Err(AppError::NotFound(_))
    ));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Whatever is requested, reservations never exceed on-hand stock
    #[test]
    fn prop_reservations_bounded_by_stock(
        on_hand in 0i32..200,
        requests in prop::collection::vec(1i32..80, 1..8),
    ) {
        let (reserved, available) = tokio_test::block_on(async {
            let yard = Yard::new().await;
            yard.add_item(SKU, 0).await;
            yard.set_stock(SKU, FARM_WS, on_hand).await;
            let project = yard.project("Prop Build").await;
            let allocations = yard.allocations();

            for quantity in &requests {
                let _ = allocations
                    .allocate(&yard.actor, &project.project_id, &request(*quantity))
                    .await;
            }
            let availability = allocations.available(SKU, FARM_WS).await.unwrap();
            (availability.reserved, availability.available)
        });

        prop_assert!(reserved <= on_hand);
        prop_assert!(available >= 0);
        prop_assert_eq!(available, on_hand - reserved);
    }
}
