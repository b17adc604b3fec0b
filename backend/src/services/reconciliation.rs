//! Par levels and physical-count reconciliation

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    below_par_alerts, reconcile, validate_count_sheet, validate_location_id, Actor, AuditAction,
    CountMeta, CountedItem, NewAuditEntry, NewReconciliation, ParAlert, ReconciliationReport,
};

use crate::error::{AppError, AppResult};
use crate::notifications::{dispatch, InventoryEvent, Notifier};
use crate::services::audit;
use crate::services::ledger::{
    get_quantity, require_item, require_physical_location, set_quantity,
};
use crate::store::Store;

/// A count sheet for one location
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCountInput {
    pub location_id: String,
    pub items: Vec<CountedItem>,
    pub notes: Option<String>,
    /// Write counted quantities back to the ledger
    #[serde(default)]
    pub apply_counts: bool,
}

#[derive(Clone)]
pub struct ReconciliationService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Items whose physical stock at a hub is below that hub's par level
    pub async fn below_par_alerts(&self) -> AppResult<Vec<ParAlert>> {
        let mut uow = self.store.begin().await?;
        let items = uow.list_items().await?;
        let locations = uow.list_locations().await?;
        let stock = uow.list_stock_levels(None).await?;
        Ok(below_par_alerts(&items, &locations, &stock))
    }

    /// Record a count sheet and, if asked, correct the ledger to match it
    pub async fn submit(
        &self,
        actor: &Actor,
        input: SubmitCountInput,
    ) -> AppResult<ReconciliationReport> {
        validate_location_id(&input.location_id)
            .map_err(|e| AppError::validation("location_id", e))?;
        validate_count_sheet(&input.items).map_err(|(field, msg)| AppError::validation(field, msg))?;

        let mut uow = self.store.begin().await?;
        require_physical_location(uow.as_mut(), "location_id", &input.location_id).await?;
        for item in &input.items {
            require_item(uow.as_mut(), &item.sku).await?;
        }

        let report = uow
            .insert_reconciliation(&NewReconciliation {
                location_id: input.location_id.clone(),
                submitted_by: actor.email.clone(),
                notes: input.notes.clone(),
                applied: input.apply_counts,
                lines: reconcile(&input.items),
            })
            .await?;
        audit::record(
            uow.as_mut(),
            NewAuditEntry::new(
                &actor.email,
                AuditAction::PhysicalCount,
                format!(
                    "Reconciliation #{} submitted: {} of {} lines differ",
                    report.id,
                    report.discrepancy_count,
                    report.lines.len()
                ),
            )
            .location(&report.location_id)
            .notes(input.notes.as_deref()),
        )
        .await?;

        if input.apply_counts {
            let meta = CountMeta {
                counted_on: Utc::now().date_naive(),
                counted_by: actor.email.clone(),
            };
            // Compared against the ledger, not the sheet's system quantity,
            // which may be stale by the time the count is applied.
            for line in &report.lines {
                let on_hand = get_quantity(uow.as_mut(), &line.sku, &report.location_id).await?;
                if on_hand == line.counted_qty {
                    continue;
                }
                let change = set_quantity(
                    uow.as_mut(),
                    &line.sku,
                    &report.location_id,
                    line.counted_qty,
                    Some(&meta),
                )
                .await?;
                audit::record(
                    uow.as_mut(),
                    NewAuditEntry::new(
                        &actor.email,
                        AuditAction::PhysicalCount,
                        format!("Count applied from reconciliation #{}", report.id),
                    )
                    .sku(&line.sku)
                    .location(&report.location_id)
                    .quantities(change.before, change.after),
                )
                .await?;
            }
        }
        uow.commit().await?;

        if report.discrepancy_count > 0 {
            tracing::warn!(
                report_id = report.id,
                location = %report.location_id,
                applied = report.applied,
                "Physical count found {} discrepancies",
                report.discrepancy_count
            );
        } else {
            tracing::info!(report_id = report.id, "Physical count matched the ledger");
        }
        dispatch(
            &self.notifier,
            InventoryEvent::ReconciliationSubmitted {
                report: report.clone(),
            },
        );

        Ok(report)
    }

    pub async fn get(&self, id: i64) -> AppResult<ReconciliationReport> {
        let mut uow = self.store.begin().await?;
        uow.get_reconciliation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reconciliation report {}", id)))
    }

    /// Newest first
    pub async fn list(&self, location_id: Option<&str>) -> AppResult<Vec<ReconciliationReport>> {
        let mut uow = self.store.begin().await?;
        uow.list_reconciliations(location_id).await
    }
}
