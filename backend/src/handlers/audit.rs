//! HTTP handlers for the audit trail

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{AuditAction, AuditQuery};

use crate::error::AppResult;
use crate::services::{AuditService, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditListQuery {
    pub sku: Option<String>,
    pub location_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
    pub format: Option<String>, // "json" or "csv"
}

/// Audit entries, newest first
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> AppResult<Response> {
    let service = AuditService::new(state.store);
    let entries = service
        .list(&AuditQuery {
            sku: query.sku,
            location_id: query.location_id,
            action: query.action,
            limit: query.limit,
        })
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::audit_csv(&entries)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"audit_log.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(entries).into_response())
    }
}
