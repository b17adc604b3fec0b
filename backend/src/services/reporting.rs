//! CSV exports of the audit trail, count reports and par alerts

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{AuditLogEntry, ReconciliationReport};

use crate::error::{AppError, AppResult};

/// Flat CSV row for one reconciliation line
#[derive(Debug, Serialize)]
pub struct ReconciliationCsvRow<'a> {
    pub report_id: i64,
    pub location_id: &'a str,
    pub submitted_by: &'a str,
    pub submitted_at: DateTime<Utc>,
    pub applied: bool,
    pub sku: &'a str,
    pub system_qty: i32,
    pub counted_qty: i32,
    pub difference: i32,
}

pub struct ReportingService;

impl ReportingService {
    /// Serialize flat records to CSV with a header row
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }

    pub fn audit_csv(entries: &[AuditLogEntry]) -> AppResult<String> {
        Self::export_to_csv(entries)
    }

    /// One row per counted line across all reports
    pub fn reconciliation_csv(reports: &[ReconciliationReport]) -> AppResult<String> {
        let rows: Vec<ReconciliationCsvRow> = reports
            .iter()
            .flat_map(|report| {
                report.lines.iter().map(move |line| ReconciliationCsvRow {
                    report_id: report.id,
                    location_id: &report.location_id,
                    submitted_by: &report.submitted_by,
                    submitted_at: report.submitted_at,
                    applied: report.applied,
                    sku: &line.sku,
                    system_qty: line.system_qty,
                    counted_qty: line.counted_qty,
                    difference: line.difference,
                })
            })
            .collect();
        Self::export_to_csv(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AuditAction, ReconciliationLine};

    #[test]
    fn audit_rows_have_a_header_and_snake_case_actions() {
        let entry = AuditLogEntry {
            id: 1,
            timestamp: Utc::now(),
            actor: "yard@example.com".to_string(),
            action: AuditAction::StockAdjustment,
            sku: Some("CDR-2x6x12".to_string()),
            location_id: Some("FARM-WS".to_string()),
            quantity_before: Some(100),
            quantity_after: Some(90),
            reason: "Damaged boards".to_string(),
            notes: None,
        };

        let csv = ReportingService::audit_csv(&[entry]).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("id,timestamp,actor,action"));
        let row = lines.next().unwrap();
        assert!(row.contains("stock_adjustment"));
        assert!(row.contains("Damaged boards"));
    }

    #[test]
    fn reconciliation_reports_flatten_to_lines() {
        let report = ReconciliationReport {
            id: 7,
            location_id: "FARM-WS".to_string(),
            submitted_by: "counter@example.com".to_string(),
            submitted_at: Utc::now(),
            discrepancy_count: 1,
            applied: false,
            notes: None,
            lines: vec![
                ReconciliationLine {
                    sku: "A".to_string(),
                    system_qty: 10,
                    counted_qty: 8,
                    difference: -2,
                },
                ReconciliationLine {
                    sku: "B".to_string(),
                    system_qty: 4,
                    counted_qty: 4,
                    difference: 0,
                },
            ],
        };

        let csv = ReportingService::reconciliation_csv(&[report]).unwrap();
        // header plus one row per line
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("7,FARM-WS"));
    }
}
