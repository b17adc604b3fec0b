//! Audit recorder
//!
//! Entries are appended inside the caller's unit of work, so an operation and
//! its audit trail commit or roll back together.

use std::sync::Arc;

use shared::{validate_required, AuditLogEntry, AuditQuery, NewAuditEntry};

use crate::error::{AppError, AppResult};
use crate::store::{Store, UnitOfWork};

/// Append one entry; the store assigns id and timestamp
pub async fn record(uow: &mut dyn UnitOfWork, entry: NewAuditEntry) -> AppResult<AuditLogEntry> {
    validate_required(&entry.reason).map_err(|e| AppError::validation("reason", e))?;
    uow.insert_audit(&entry).await
}

/// Read side of the audit trail
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn Store>,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest entries first
    pub async fn list(&self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        let mut uow = self.store.begin().await?;
        uow.list_audit(query).await
    }
}
