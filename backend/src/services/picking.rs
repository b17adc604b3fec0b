//! Pick lists: turning a project's reservations into floor work

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    validate_positive_quantity, Actor, Allocation, AllocationAction, AllocationFilter,
    AllocationStatus, AuditAction, NewAuditEntry, NewPickList, PickAction, PickList,
    StateMachine,
};

use crate::error::{AppError, AppResult};
use crate::services::allocations::{require_project, reserved_at};
use crate::services::audit;
use crate::services::ledger::{add_quantity, get_quantity};
use crate::store::{Store, UnitOfWork};

/// Body of a pick confirmation
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPickInput {
    pub quantity_picked: i32,
}

/// Reservation consumed by a completed pick
///
/// Prefers the allocation the pick was generated from; otherwise the oldest
/// Reserved allocation of the same project, SKU and location.
async fn matching_reservation(
    uow: &mut dyn UnitOfWork,
    pick: &PickList,
) -> AppResult<Option<Allocation>> {
    if let Some(id) = pick.allocation_id {
        if let Some(linked) = uow.get_allocation(id).await? {
            if linked.status == AllocationStatus::Reserved {
                return Ok(Some(linked));
            }
        }
    }

    let candidates = uow
        .list_allocations(&AllocationFilter {
            project_id: Some(pick.project_id.clone()),
            ..AllocationFilter::reserved_at(&pick.sku, &pick.pick_from_location)
        })
        .await?;
    Ok(candidates.into_iter().min_by_key(|a| a.id))
}

async fn load(uow: &mut dyn UnitOfWork, id: i64) -> AppResult<PickList> {
    uow.get_pick_list(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pick list {}", id)))
}

#[derive(Clone)]
pub struct PickingService {
    store: Arc<dyn Store>,
}

impl PickingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// One Pending pick list per Reserved allocation not already being picked
    pub async fn generate(&self, actor: &Actor, project_id: &str) -> AppResult<Vec<PickList>> {
        let mut uow = self.store.begin().await?;
        require_project(uow.as_mut(), project_id).await?;

        let reserved = uow
            .list_allocations(&AllocationFilter {
                project_id: Some(project_id.to_string()),
                status: Some(AllocationStatus::Reserved),
                ..Default::default()
            })
            .await?;
        if reserved.is_empty() {
            return Err(AppError::NoReservations(project_id.to_string()));
        }

        let already_open: HashSet<i64> = uow
            .list_pick_lists(Some(project_id))
            .await?
            .into_iter()
            .filter(PickList::is_open)
            .filter_map(|p| p.allocation_id)
            .collect();

        let mut created = Vec::new();
        for allocation in reserved.iter().filter(|a| !already_open.contains(&a.id)) {
            created.push(uow.insert_pick_list(&NewPickList::from(allocation)).await?);
        }
        uow.commit().await?;

        tracing::info!(
            project_id,
            created = created.len(),
            skipped = reserved.len() - created.len(),
            "Pick lists generated by {}",
            actor
        );
        Ok(created)
    }

    /// Mark a pick as being worked on the floor
    pub async fn start(&self, actor: &Actor, id: i64) -> AppResult<PickList> {
        let mut uow = self.store.begin().await?;
        let mut pick = load(uow.as_mut(), id).await?;
        pick.status = pick.status.apply(PickAction::Start)?;
        uow.update_pick_list(&pick).await?;
        uow.commit().await?;

        tracing::debug!(pick_id = id, "Pick started by {}", actor);
        Ok(pick)
    }

    /// Debit the pick location and consume one matching reservation
    pub async fn confirm_pick(
        &self,
        actor: &Actor,
        id: i64,
        input: ConfirmPickInput,
    ) -> AppResult<PickList> {
        validate_positive_quantity(input.quantity_picked)
            .map_err(|e| AppError::validation("quantity_picked", e))?;

        let mut uow = self.store.begin().await?;
        let mut pick = load(uow.as_mut(), id).await?;
        let next = pick.status.apply(PickAction::Complete)?;

        if input.quantity_picked > pick.quantity_requested {
            return Err(AppError::validation(
                "quantity_picked",
                format!(
                    "Cannot pick {} when only {} were requested",
                    input.quantity_picked, pick.quantity_requested
                ),
            ));
        }

        // Stock held for other reservations at this location is off limits.
        let reservation = matching_reservation(uow.as_mut(), &pick).await?;
        let on_hand = get_quantity(uow.as_mut(), &pick.sku, &pick.pick_from_location).await?;
        let reserved = reserved_at(uow.as_mut(), &pick.sku, &pick.pick_from_location).await?;
        let held_for_others = reserved - reservation.as_ref().map_or(0, |a| a.quantity);
        let pickable = (on_hand - held_for_others).max(0);
        if input.quantity_picked > pickable {
            return Err(AppError::insufficient(
                &pick.sku,
                &pick.pick_from_location,
                pickable,
                input.quantity_picked,
            ));
        }

        let change = add_quantity(
            uow.as_mut(),
            &pick.sku,
            &pick.pick_from_location,
            -input.quantity_picked,
        )
        .await?;

        match reservation {
            Some(allocation) => {
                let pulled = allocation.status.apply(AllocationAction::Pull)?;
                uow.set_allocation_status(allocation.id, pulled).await?;
            }
            None => tracing::warn!(
                pick_id = id,
                project_id = %pick.project_id,
                sku = %pick.sku,
                "Pick confirmed with no Reserved allocation left to pull"
            ),
        }

        pick.status = next;
        pick.quantity_picked = input.quantity_picked;
        pick.picked_by = Some(actor.email.clone());
        pick.pick_date = Some(Utc::now());
        uow.update_pick_list(&pick).await?;

        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::Pick,
                format!(
                    "Picked {} for {} (pick list #{})",
                    input.quantity_picked, pick.project_id, pick.id
                ),
            )
            .sku(&pick.sku)
            .location(&pick.pick_from_location)
            .quantities(change.before, change.after),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(
            pick_id = id,
            quantity = input.quantity_picked,
            "Pick confirmed by {}",
            actor
        );
        Ok(pick)
    }

    /// Abandon a pick; its reservation stays Reserved
    pub async fn cancel(&self, actor: &Actor, id: i64) -> AppResult<PickList> {
        let mut uow = self.store.begin().await?;
        let mut pick = load(uow.as_mut(), id).await?;
        pick.status = pick.status.apply(PickAction::Cancel)?;
        uow.update_pick_list(&pick).await?;
        uow.commit().await?;

        tracing::info!(pick_id = id, "Pick cancelled by {}", actor);
        Ok(pick)
    }

    pub async fn list(&self, project_id: Option<&str>) -> AppResult<Vec<PickList>> {
        let mut uow = self.store.begin().await?;
        uow.list_pick_lists(project_id).await
    }
}
