//! Shared fixtures for backend integration tests
//!
//! Every test runs against a fresh in-memory store seeded with the default
//! locations, so scenarios are isolated and need no database.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lumber_inventory::notifications::{InventoryEvent, Notifier};
use lumber_inventory::services::ledger::{self, AdjustStockInput};
use lumber_inventory::services::{
    AllocationService, AuditService, CatalogService, LedgerService, PickingService,
    ReconciliationService, TransferService,
};
use lumber_inventory::store::{MemoryStore, Store};
use shared::{Actor, AuditLogEntry, AuditQuery, Hub, ItemStatus, NewItem, NewProject, Project};

pub const SKU: &str = "CDR-2x6x12";
pub const FARM_WS: &str = "FARM-WS";
pub const FARM_LOFT: &str = "FARM-LOFT";
pub const MKE_SHOP: &str = "MKE-SHOP";
pub const TRANSIT: &str = "TRANSIT";

/// Notifier that remembers event subjects
#[derive(Default)]
pub struct RecordingNotifier {
    pub subjects: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &InventoryEvent) -> anyhow::Result<()> {
        self.subjects.lock().unwrap().push(event.subject());
        Ok(())
    }
}

pub struct Yard {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<RecordingNotifier>,
    pub actor: Actor,
}

impl Yard {
    pub async fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        CatalogService::new(store.clone())
            .seed_locations()
            .await
            .unwrap();
        Self {
            store,
            notifier: Arc::new(RecordingNotifier::default()),
            actor: Actor::new("yard@example.com"),
        }
    }

    /// The usual starting point: one cedar SKU with 100 units in the Farm wood shed
    pub async fn with_cedar() -> Self {
        let yard = Self::new().await;
        yard.add_item(SKU, 50).await;
        yard.set_stock(SKU, FARM_WS, 100).await;
        yard
    }

    fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.store.clone())
    }

    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.store.clone())
    }

    pub fn transfers(&self) -> TransferService {
        TransferService::new(self.store.clone(), self.notifier())
    }

    pub fn allocations(&self) -> AllocationService {
        AllocationService::new(self.store.clone())
    }

    pub fn picking(&self) -> PickingService {
        PickingService::new(self.store.clone())
    }

    pub fn reconciliation(&self) -> ReconciliationService {
        ReconciliationService::new(self.store.clone(), self.notifier())
    }

    pub fn audit(&self) -> AuditService {
        AuditService::new(self.store.clone())
    }

    pub async fn add_item(&self, sku: &str, farm_par_level: i32) {
        self.catalog()
            .create_item(
                &self.actor,
                NewItem {
                    sku: sku.to_string(),
                    description: format!("{} boards", sku),
                    category: Some("Dimensional".to_string()),
                    species: Some("Cedar".to_string()),
                    dimensions: None,
                    farm_par_level,
                    mke_par_level: 0,
                    status: ItemStatus::Active,
                },
            )
            .await
            .unwrap();
    }

    pub async fn set_stock(&self, sku: &str, location_id: &str, quantity: i32) {
        self.ledger()
            .adjust_stock(
                &self.actor,
                AdjustStockInput {
                    sku: sku.to_string(),
                    location_id: location_id.to_string(),
                    quantity,
                    reason: "Opening balance".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
    }

    pub async fn quantity(&self, sku: &str, location_id: &str) -> i32 {
        let mut uow = self.store.begin().await.unwrap();
        ledger::get_quantity(uow.as_mut(), sku, location_id)
            .await
            .unwrap()
    }

    pub async fn project(&self, name: &str) -> Project {
        self.catalog()
            .create_project(
                &self.actor,
                NewProject {
                    name: name.to_string(),
                    client: "Lakeside Builders".to_string(),
                    hub: Hub::Farm,
                    status: Default::default(),
                    lead: None,
                    start_date: None,
                    end_date: None,
                    notes: None,
                },
            )
            .await
            .unwrap()
    }

    /// Newest first
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit()
            .list(&AuditQuery {
                limit: Some(5000),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub async fn audit_count(&self) -> usize {
        self.audit_entries().await.len()
    }

    /// Let spawned notification tasks run
    pub async fn settle(&self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}
