//! Inter-hub transfers
//!
//! Stock leaves the source on ship and sits in the Transit zone until it is
//! received at the destination. Requesting a transfer only records intent.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    validate_location_id, validate_positive_quantity, validate_sku, Actor, AuditAction,
    NewAuditEntry, NewTransfer, StateMachine, Transfer, TransferAction, TransferStatus,
    TRANSIT_LOCATION_ID,
};

use crate::error::{AppError, AppResult};
use crate::notifications::{dispatch, InventoryEvent, Notifier};
use crate::services::audit;
use crate::services::ledger::{
    add_quantity, get_quantity, remove_floored, require_item, require_physical_location,
};
use crate::store::{Store, UnitOfWork};

/// Body of a receive request; omitting the quantity receives everything shipped
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiveTransferInput {
    pub quantity_received: Option<i32>,
}

#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl TransferService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Request a transfer; no stock moves until it ships
    pub async fn create(&self, actor: &Actor, input: NewTransfer) -> AppResult<Transfer> {
        validate_sku(&input.sku).map_err(|e| AppError::validation("sku", e))?;
        validate_positive_quantity(input.quantity)
            .map_err(|e| AppError::validation("quantity", e))?;
        validate_location_id(&input.from_location)
            .map_err(|e| AppError::validation("from_location", e))?;
        validate_location_id(&input.to_location)
            .map_err(|e| AppError::validation("to_location", e))?;
        if input.from_location == input.to_location {
            return Err(AppError::validation(
                "to_location",
                "Destination must differ from source",
            ));
        }

        let mut uow = self.store.begin().await?;
        require_item(uow.as_mut(), &input.sku).await?;
        require_physical_location(uow.as_mut(), "from_location", &input.from_location).await?;
        require_physical_location(uow.as_mut(), "to_location", &input.to_location).await?;

        let available = get_quantity(uow.as_mut(), &input.sku, &input.from_location).await?;
        if available < input.quantity {
            return Err(AppError::insufficient(
                &input.sku,
                &input.from_location,
                available,
                input.quantity,
            ));
        }

        let transfer = uow.insert_transfer(&input, &actor.email).await?;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::Transfer,
                format!(
                    "Transfer #{} requested: {} from {} to {}",
                    transfer.id, transfer.quantity, transfer.from_location, transfer.to_location
                ),
            )
            .sku(&transfer.sku)
            .location(&transfer.from_location)
            .notes(transfer.notes.as_deref()),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(
            transfer_id = transfer.id,
            sku = %transfer.sku,
            "Transfer requested by {}",
            actor
        );
        dispatch(
            &self.notifier,
            InventoryEvent::TransferRequested {
                transfer: transfer.clone(),
            },
        );

        Ok(transfer)
    }

    /// Move the quantity from the source into Transit
    pub async fn ship(&self, actor: &Actor, id: i64) -> AppResult<Transfer> {
        let mut uow = self.store.begin().await?;
        let mut transfer = load(uow.as_mut(), id).await?;
        let next = transfer.status.apply(TransferAction::Ship)?;

        let available = get_quantity(uow.as_mut(), &transfer.sku, &transfer.from_location).await?;
        if available < transfer.quantity {
            return Err(AppError::insufficient(
                &transfer.sku,
                &transfer.from_location,
                available,
                transfer.quantity,
            ));
        }

        let source = add_quantity(
            uow.as_mut(),
            &transfer.sku,
            &transfer.from_location,
            -transfer.quantity,
        )
        .await?;
        add_quantity(
            uow.as_mut(),
            &transfer.sku,
            TRANSIT_LOCATION_ID,
            transfer.quantity,
        )
        .await?;

        transfer.status = next;
        transfer.shipped_date = Some(Utc::now());
        uow.update_transfer(&transfer).await?;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::Transfer,
                format!(
                    "Transfer #{} shipped: {} to {}",
                    transfer.id, transfer.quantity, transfer.to_location
                ),
            )
            .sku(&transfer.sku)
            .location(&transfer.from_location)
            .quantities(source.before, source.after),
        )
        .await?;
        uow.commit().await?;

        tracing::info!(transfer_id = transfer.id, "Transfer shipped by {}", actor);
        dispatch(
            &self.notifier,
            InventoryEvent::TransferShipped {
                transfer: transfer.clone(),
            },
        );

        Ok(transfer)
    }

    /// Move stock out of Transit into the destination
    ///
    /// A partial receipt leaves the shortfall in Transit.
    pub async fn receive(
        &self,
        actor: &Actor,
        id: i64,
        input: ReceiveTransferInput,
    ) -> AppResult<Transfer> {
        let mut uow = self.store.begin().await?;
        let mut transfer = load(uow.as_mut(), id).await?;
        let next = transfer.status.apply(TransferAction::Receive)?;

        let quantity = input.quantity_received.unwrap_or(transfer.quantity);
        validate_positive_quantity(quantity)
            .map_err(|e| AppError::validation("quantity_received", e))?;
        if quantity > transfer.quantity {
            return Err(AppError::validation(
                "quantity_received",
                format!("Cannot receive more than the {} shipped", transfer.quantity),
            ));
        }

        let in_transit = get_quantity(uow.as_mut(), &transfer.sku, TRANSIT_LOCATION_ID).await?;
        if in_transit < quantity {
            return Err(AppError::insufficient(
                &transfer.sku,
                TRANSIT_LOCATION_ID,
                in_transit,
                quantity,
            ));
        }

        remove_floored(uow.as_mut(), &transfer.sku, TRANSIT_LOCATION_ID, quantity).await?;
        let destination =
            add_quantity(uow.as_mut(), &transfer.sku, &transfer.to_location, quantity).await?;

        transfer.status = next;
        transfer.quantity_received = Some(quantity);
        transfer.received_by = Some(actor.email.clone());
        transfer.received_date = Some(Utc::now());
        uow.update_transfer(&transfer).await?;

        let shortfall = transfer.quantity - quantity;
        let mut reason = format!(
            "Transfer #{} received: {} from {}",
            transfer.id, quantity, transfer.from_location
        );
        if shortfall > 0 {
            reason.push_str(&format!(" ({} short, left in Transit)", shortfall));
        }
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(&actor.email, AuditAction::Transfer, reason)
                .sku(&transfer.sku)
                .location(&transfer.to_location)
                .quantities(destination.before, destination.after),
        )
        .await?;
        uow.commit().await?;

        if shortfall > 0 {
            tracing::warn!(
                transfer_id = transfer.id,
                sku = %transfer.sku,
                "Partial receipt: {} of {} received, {} remain in Transit",
                quantity,
                transfer.quantity,
                shortfall
            );
        } else {
            tracing::info!(transfer_id = transfer.id, "Transfer received by {}", actor);
        }
        dispatch(
            &self.notifier,
            InventoryEvent::TransferReceived {
                transfer: transfer.clone(),
                shortfall,
            },
        );

        Ok(transfer)
    }

    /// Cancel a pending or in-flight transfer, returning shipped stock to the source
    pub async fn cancel(&self, actor: &Actor, id: i64) -> AppResult<Transfer> {
        let mut uow = self.store.begin().await?;
        let transfer = load(uow.as_mut(), id).await?;
        let (transfer, stock_returned) = cancel_in(uow.as_mut(), actor, transfer).await?;
        uow.commit().await?;

        tracing::info!(
            transfer_id = transfer.id,
            stock_returned,
            "Transfer cancelled by {}",
            actor
        );
        dispatch(
            &self.notifier,
            InventoryEvent::TransferCancelled {
                transfer: transfer.clone(),
                stock_returned,
            },
        );

        Ok(transfer)
    }

    /// Hard delete; an in-flight transfer is cancelled first so Transit stock goes home
    pub async fn delete(&self, actor: &Actor, id: i64) -> AppResult<()> {
        let mut uow = self.store.begin().await?;
        let transfer = load(uow.as_mut(), id).await?;

        let returned = if transfer.status == TransferStatus::InTransit {
            let (_, returned) = cancel_in(uow.as_mut(), actor, transfer).await?;
            returned
        } else {
            false
        };

        uow.delete_transfer(id).await?;
        uow.commit().await?;

        tracing::info!(
            transfer_id = id,
            stock_returned = returned,
            "Transfer deleted by {}",
            actor
        );
        Ok(())
    }

    pub async fn get(&self, id: i64) -> AppResult<Transfer> {
        let mut uow = self.store.begin().await?;
        load(uow.as_mut(), id).await
    }

    /// Newest first
    pub async fn list(&self, status: Option<TransferStatus>) -> AppResult<Vec<Transfer>> {
        let mut uow = self.store.begin().await?;
        uow.list_transfers(status).await
    }
}

async fn load(uow: &mut dyn UnitOfWork, id: i64) -> AppResult<Transfer> {
    uow.get_transfer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transfer {}", id)))
}

/// Transition to Cancelled inside `uow`, reversing the ship if stock is in Transit
async fn cancel_in(
    uow: &mut dyn UnitOfWork,
    actor: &Actor,
    mut transfer: Transfer,
) -> AppResult<(Transfer, bool)> {
    let next = transfer.status.apply(TransferAction::Cancel)?;
    let stock_returned = transfer.status.holds_transit_stock();

    let entry = if stock_returned {
        remove_floored(uow, &transfer.sku, TRANSIT_LOCATION_ID, transfer.quantity).await?;
        let source =
            add_quantity(uow, &transfer.sku, &transfer.from_location, transfer.quantity).await?;
        NewAuditEntry::new(
            &actor.email,
            AuditAction::Transfer,
            format!(
                "Transfer #{} cancelled: {} returned to {}",
                transfer.id, transfer.quantity, transfer.from_location
            ),
        )
        .quantities(source.before, source.after)
    } else {
        NewAuditEntry::new(
            &actor.email,
            AuditAction::Transfer,
            format!("Transfer #{} cancelled before shipping", transfer.id),
        )
    };

    transfer.status = next;
    uow.update_transfer(&transfer).await?;
    audit::record(
        uow,
        entry.sku(&transfer.sku).location(&transfer.from_location),
    )
    .await?;

    Ok((transfer, stock_returned))
}
