//! Catalog and project tests
//!
//! Tests for:
//! - Item creation, update and deletion
//! - Sequential project ids
//! - Project status and the client view

mod common;

use common::*;
use lumber_inventory::AppError;
use shared::{
    AuditAction, Hub, ItemStatus, ItemUpdate, NewItem, NewProject, ProjectStatus,
};

// ============================================================================
// Item Tests
// ============================================================================

#[tokio::test]
async fn test_duplicate_sku_conflicts() {
    let yard = Yard::new().await;
    yard.add_item(SKU, 50).await;

    let err = yard
        .catalog()
        .create_item(
            &yard.actor,
            NewItem {
                sku: SKU.to_string(),
                description: "Again".to_string(),
                category: None,
                species: None,
                dimensions: None,
                farm_par_level: 0,
                mke_par_level: 0,
                status: ItemStatus::Active,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
}

#[tokio::test]
async fn test_update_audits_changed_fields_only() {
    let yard = Yard::new().await;
    yard.add_item(SKU, 50).await;
    let catalog = yard.catalog();
    let before = yard.audit_count().await;

    let unchanged = catalog
        .update_item(
            &yard.actor,
            SKU,
            ItemUpdate {
                farm_par_level: Some(50),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.farm_par_level, 50);
    assert_eq!(yard.audit_count().await, before);

    let updated = catalog
        .update_item(
            &yard.actor,
            SKU,
            ItemUpdate {
                mke_par_level: Some(20),
                status: Some(ItemStatus::Discontinuing),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.mke_par_level, 20);
    assert_eq!(updated.status, ItemStatus::Discontinuing);

    let latest = &yard.audit_entries().await[0];
    assert_eq!(latest.action, AuditAction::ItemUpdated);
    assert!(latest.reason.contains("mke_par_level"));
    assert!(latest.reason.contains("status"));
}

#[tokio::test]
async fn test_negative_par_rejected() {
    let yard = Yard::new().await;
    yard.add_item(SKU, 50).await;
    let err = yard
        .catalog()
        .update_item(
            &yard.actor,
            SKU,
            ItemUpdate {
                farm_par_level: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_delete_item_removes_its_stock() {
    let yard = Yard::with_cedar().await;
    let catalog = yard.catalog();

    catalog.delete_item(&yard.actor, SKU).await.unwrap();

    assert!(matches!(catalog.get_item(SKU).await, Err(AppError::NotFound(_))));
    assert!(yard.ledger().list_stock(Some(SKU)).await.unwrap().is_empty());
    // the audit trail outlives the item
    assert_eq!(yard.audit_entries().await[0].sku.as_deref(), Some(SKU));

    assert!(matches!(
        catalog.delete_item(&yard.actor, SKU).await,
        Err(AppError::NotFound(_))
    ));
}

// ============================================================================
// Project Tests
// ============================================================================

fn new_project(name: &str, client: &str, hub: Hub) -> NewProject {
    NewProject {
        name: name.to_string(),
        client: client.to_string(),
        hub,
        status: ProjectStatus::Planning,
        lead: Some("Sam".to_string()),
        start_date: None,
        end_date: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_project_ids_are_sequential() {
    let yard = Yard::new().await;
    let catalog = yard.catalog();

    let first = catalog
        .create_project(&yard.actor, new_project("Deck", "Lakeside Builders", Hub::Farm))
        .await
        .unwrap();
    let second = catalog
        .create_project(&yard.actor, new_project("Porch", "Riverside Homes", Hub::Mke))
        .await
        .unwrap();

    assert_eq!(first.project_id, "PRJ-001");
    assert_eq!(second.project_id, "PRJ-002");
    assert_eq!(catalog.get_project("PRJ-002").await.unwrap().name, "Porch");
}

#[tokio::test]
async fn test_project_validation() {
    let yard = Yard::new().await;
    let catalog = yard.catalog();

    assert!(matches!(
        catalog
            .create_project(&yard.actor, new_project("Deck", "Lakeside", Hub::Transit))
            .await,
        Err(AppError::Validation { .. })
    ));
    assert!(matches!(
        catalog
            .create_project(&yard.actor, new_project("  ", "Lakeside", Hub::Farm))
            .await,
        Err(AppError::Validation { .. })
    ));

    let backwards = NewProject {
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
        end_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
        ..new_project("Deck", "Lakeside", Hub::Farm)
    };
    assert!(matches!(
        catalog.create_project(&yard.actor, backwards).await,
        Err(AppError::Validation { .. })
    ));
    assert!(catalog.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clients_group_projects() {
    let yard = Yard::new().await;
    let catalog = yard.catalog();

    catalog
        .create_project(&yard.actor, new_project("Deck", "Lakeside Builders", Hub::Farm))
        .await
        .unwrap();
    let porch = catalog
        .create_project(&yard.actor, new_project("Porch", "Lakeside Builders", Hub::Mke))
        .await
        .unwrap();
    catalog
        .create_project(&yard.actor, new_project("Shed", "Riverside Homes", Hub::Farm))
        .await
        .unwrap();
    catalog
        .update_project_status(&yard.actor, &porch.project_id, ProjectStatus::Active)
        .await
        .unwrap();

    let clients = catalog.list_clients().await.unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].client, "Lakeside Builders");
    assert_eq!(clients[0].project_count, 2);
    assert_eq!(clients[0].active, 1);
    assert_eq!(clients[0].planning, 1);
}

#[tokio::test]
async fn test_locations_are_seeded() {
    let yard = Yard::new().await;
    let locations = yard.catalog().list_locations().await.unwrap();
    assert_eq!(locations.len(), 5);
    assert!(locations.iter().any(|l| l.location_id == TRANSIT && !l.is_physical()));

    // seeding again is harmless
    yard.catalog().seed_locations().await.unwrap();
    assert_eq!(yard.catalog().list_locations().await.unwrap().len(), 5);
}
