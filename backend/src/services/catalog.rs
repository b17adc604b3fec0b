//! Catalog: items, locations, projects and the client view

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    default_locations, next_project_id, summarize_clients, validate_item_update,
    validate_new_item, validate_required, Actor, AuditAction, ClientSummary, Hub,
    InventoryItem, ItemUpdate, Location, NewAuditEntry, NewItem, NewProject, Project,
    ProjectStatus,
};

use crate::error::{AppError, AppResult};
use crate::services::allocations::require_project;
use crate::services::audit;
use crate::services::ledger::require_item;
use crate::store::Store;

/// Body of a project status change
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectStatusInput {
    pub status: ProjectStatus,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Items
    // ========================================================================

    pub async fn create_item(&self, actor: &Actor, input: NewItem) -> AppResult<InventoryItem> {
        validate_new_item(&input).map_err(|(field, msg)| AppError::validation(field, msg))?;

        let now = Utc::now();
        let item = InventoryItem {
            sku: input.sku,
            description: input.description.trim().to_string(),
            category: input.category,
            species: input.species,
            dimensions: input.dimensions,
            farm_par_level: input.farm_par_level,
            mke_par_level: input.mke_par_level,
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.store.begin().await?;
        uow.insert_item(&item).await?;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(&actor.email, AuditAction::ItemCreated, "Item created")
                .sku(&item.sku)
                .notes(Some(&item.description)),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(sku = %item.sku, "Item created by {}", actor);
        Ok(item)
    }

    pub async fn update_item(
        &self,
        actor: &Actor,
        sku: &str,
        update: ItemUpdate,
    ) -> AppResult<InventoryItem> {
        validate_item_update(&update).map_err(|(field, msg)| AppError::validation(field, msg))?;

        let mut uow = self.store.begin().await?;
        let mut item = require_item(uow.as_mut(), sku).await?;
        let changed = update.apply_to(&mut item);
        if changed.is_empty() {
            return Ok(item);
        }

        item.updated_at = Utc::now();
        uow.update_item(&item).await?;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::ItemUpdated,
                format!("Updated {}", changed.join(", ")),
            )
            .sku(sku),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(sku, fields = ?changed, "Item updated by {}", actor);
        Ok(item)
    }

    /// Remove an item together with its stock rows, allocations, transfers and picks
    pub async fn delete_item(&self, actor: &Actor, sku: &str) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_item(sku).await? {
            return Err(AppError::NotFound(format!("Item {}", sku)));
        }
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(&actor.email, AuditAction::ItemUpdated, "deleted").sku(sku),
        )
        .await?;
        uow.commit().await?;

        tracing::warn!(sku, "Item deleted by {}", actor);
        Ok(())
    }

    pub async fn get_item(&self, sku: &str) -> AppResult<InventoryItem> {
        let mut uow = self.store.begin().await?;
        require_item(uow.as_mut(), sku).await
    }

    pub async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        let mut uow = self.store.begin().await?;
        uow.list_items().await
    }

    // ========================================================================
    // Locations
    // ========================================================================

    pub async fn list_locations(&self) -> AppResult<Vec<Location>> {
        let mut uow = self.store.begin().await?;
        uow.list_locations().await
    }

    /// Upsert the reference locations; safe to run on every startup
    pub async fn seed_locations(&self) -> AppResult<usize> {
        let locations = default_locations();
        let mut uow = self.store.begin().await?;
        for location in &locations {
            uow.upsert_location(location).await?;
        }
        uow.commit().await?;

        tracing::info!("Seeded {} locations", locations.len());
        Ok(locations.len())
    }

    // ========================================================================
    // Projects
    // ========================================================================

    pub async fn create_project(&self, actor: &Actor, input: NewProject) -> AppResult<Project> {
        validate_required(&input.name).map_err(|e| AppError::validation("name", e))?;
        validate_required(&input.client).map_err(|e| AppError::validation("client", e))?;
        if input.hub == Hub::Transit {
            return Err(AppError::validation("hub", "Projects belong to Farm or MKE"));
        }
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end < start {
                return Err(AppError::validation("end_date", "End date is before start date"));
            }
        }

        let mut uow = self.store.begin().await?;
        let existing = uow.list_projects().await?;
        let project = Project {
            project_id: next_project_id(existing.iter().map(|p| p.project_id.as_str())),
            name: input.name.trim().to_string(),
            client: input.client.trim().to_string(),
            hub: input.hub,
            status: input.status,
            lead: input.lead,
            start_date: input.start_date,
            end_date: input.end_date,
            notes: input.notes,
            created_at: Utc::now(),
        };
        uow.insert_project(&project).await?;
        uow.commit().await?;

        tracing::info!(project_id = %project.project_id, "Project created by {}", actor);
        Ok(project)
    }

    pub async fn get_project(&self, project_id: &str) -> AppResult<Project> {
        let mut uow = self.store.begin().await?;
        require_project(uow.as_mut(), project_id).await
    }

    pub async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let mut uow = self.store.begin().await?;
        uow.list_projects().await
    }

    pub async fn update_project_status(
        &self,
        actor: &Actor,
        project_id: &str,
        status: ProjectStatus,
    ) -> AppResult<Project> {
        let mut uow = self.store.begin().await?;
        let mut project = require_project(uow.as_mut(), project_id).await?;
        project.status = status;
        uow.update_project(&project).await?;
        uow.commit().await?;

        tracing::info!(project_id, status = %status, "Project status changed by {}", actor);
        Ok(project)
    }

    /// Projects grouped by client name
    pub async fn list_clients(&self) -> AppResult<Vec<ClientSummary>> {
        let projects = self.list_projects().await?;
        Ok(summarize_clients(&projects))
    }
}
