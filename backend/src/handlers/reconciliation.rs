//! HTTP handlers for par alerts and physical-count reconciliation

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::ReconciliationReport;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::reconciliation::SubmitCountInput;
use crate::services::{ReconciliationService, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReconciliationListQuery {
    pub location_id: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Debug, Deserialize)]
pub struct ParAlertQuery {
    pub format: Option<String>,
}

/// Items below par at either hub
pub async fn get_below_par_alerts(
    State(state): State<AppState>,
    Query(query): Query<ParAlertQuery>,
) -> AppResult<Response> {
    let service = ReconciliationService::new(state.store, state.notifier);
    let alerts = service.below_par_alerts().await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&alerts)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"below_par.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(alerts).into_response())
    }
}

/// Submit a count sheet for one location
pub async fn submit_reconciliation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<SubmitCountInput>,
) -> impl IntoResponse {
    let service = ReconciliationService::new(state.store, state.notifier);

    match service.submit(&actor, input).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List count reports, newest first
pub async fn list_reconciliations(
    State(state): State<AppState>,
    Query(query): Query<ReconciliationListQuery>,
) -> AppResult<Response> {
    let service = ReconciliationService::new(state.store, state.notifier);
    let reports = service.list(query.location_id.as_deref()).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::reconciliation_csv(&reports)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"reconciliations.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(reports).into_response())
    }
}

/// Get one count report with its lines
pub async fn get_reconciliation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReconciliationReport>> {
    let service = ReconciliationService::new(state.store, state.notifier);
    Ok(Json(service.get(id).await?))
}
