//! PostgreSQL store
//!
//! One unit of work is one database transaction. Rows read ahead of a write
//! are taken `FOR UPDATE` so two concurrent mutations of the same stock level,
//! transfer, allocation or pick list serialize on the row lock.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::{
    Allocation, AllocationFilter, AllocationStatus, AuditLogEntry, AuditQuery, InventoryItem,
    Location, NewAllocation, NewAuditEntry, NewPickList, NewReconciliation, NewTransfer,
    ParseStatusError, PickList, Project, ReconciliationLine, ReconciliationReport, StockLevel,
    Transfer, TransferStatus,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};

use super::{Store, UnitOfWork};
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Pooled PostgreSQL store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and optionally bring the schema up to date
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        if config.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations completed");
        }

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn parse<T>(value: &str) -> AppResult<T>
where
    T: FromStr<Err = ParseStatusError>,
{
    value
        .parse()
        .map_err(|e: ParseStatusError| AppError::Internal(e.to_string()))
}

fn conflict_on_duplicate(err: sqlx::Error, resource: &str, message: String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict {
            resource: resource.to_string(),
            message,
        },
        _ => AppError::DatabaseError(err),
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(FromRow)]
struct ItemRow {
    sku: String,
    description: String,
    category: Option<String>,
    species: Option<String>,
    dimensions: Option<String>,
    farm_par_level: i32,
    mke_par_level: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = AppError;

    fn try_from(row: ItemRow) -> AppResult<Self> {
        Ok(InventoryItem {
            status: parse(&row.status)?,
            sku: row.sku,
            description: row.description,
            category: row.category,
            species: row.species,
            dimensions: row.dimensions,
            farm_par_level: row.farm_par_level,
            mke_par_level: row.mke_par_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct LocationRow {
    location_id: String,
    name: String,
    hub: String,
    zone_type: String,
}

impl TryFrom<LocationRow> for Location {
    type Error = AppError;

    fn try_from(row: LocationRow) -> AppResult<Self> {
        Ok(Location {
            hub: parse(&row.hub)?,
            zone_type: parse(&row.zone_type)?,
            location_id: row.location_id,
            name: row.name,
        })
    }
}

#[derive(FromRow)]
struct StockRow {
    sku: String,
    location_id: String,
    quantity: i32,
    last_counted: Option<NaiveDate>,
    counted_by: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for StockLevel {
    fn from(row: StockRow) -> Self {
        StockLevel {
            sku: row.sku,
            location_id: row.location_id,
            quantity: row.quantity,
            last_counted: row.last_counted,
            counted_by: row.counted_by,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    project_id: String,
    name: String,
    client: String,
    hub: String,
    status: String,
    lead: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> AppResult<Self> {
        Ok(Project {
            hub: parse(&row.hub)?,
            status: parse(&row.status)?,
            project_id: row.project_id,
            name: row.name,
            client: row.client,
            lead: row.lead,
            start_date: row.start_date,
            end_date: row.end_date,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AllocationRow {
    id: i64,
    project_id: String,
    sku: String,
    source_location: String,
    quantity: i32,
    status: String,
    allocated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AllocationRow> for Allocation {
    type Error = AppError;

    fn try_from(row: AllocationRow) -> AppResult<Self> {
        Ok(Allocation {
            status: parse(&row.status)?,
            id: row.id,
            project_id: row.project_id,
            sku: row.sku,
            source_location: row.source_location,
            quantity: row.quantity,
            allocated_by: row.allocated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PickRow {
    id: i64,
    project_id: String,
    allocation_id: Option<i64>,
    sku: String,
    quantity_requested: i32,
    pick_from_location: String,
    quantity_picked: i32,
    status: String,
    picked_by: Option<String>,
    pick_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PickRow> for PickList {
    type Error = AppError;

    fn try_from(row: PickRow) -> AppResult<Self> {
        Ok(PickList {
            status: parse(&row.status)?,
            id: row.id,
            project_id: row.project_id,
            allocation_id: row.allocation_id,
            sku: row.sku,
            quantity_requested: row.quantity_requested,
            pick_from_location: row.pick_from_location,
            quantity_picked: row.quantity_picked,
            picked_by: row.picked_by,
            pick_date: row.pick_date,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct TransferRow {
    id: i64,
    sku: String,
    quantity: i32,
    from_location: String,
    to_location: String,
    status: String,
    request_date: DateTime<Utc>,
    shipped_date: Option<DateTime<Utc>>,
    received_date: Option<DateTime<Utc>>,
    requested_by: String,
    received_by: Option<String>,
    quantity_received: Option<i32>,
    notes: Option<String>,
}

impl TryFrom<TransferRow> for Transfer {
    type Error = AppError;

    fn try_from(row: TransferRow) -> AppResult<Self> {
        Ok(Transfer {
            status: parse(&row.status)?,
            id: row.id,
            sku: row.sku,
            quantity: row.quantity,
            from_location: row.from_location,
            to_location: row.to_location,
            request_date: row.request_date,
            shipped_date: row.shipped_date,
            received_date: row.received_date,
            requested_by: row.requested_by,
            received_by: row.received_by,
            quantity_received: row.quantity_received,
            notes: row.notes,
        })
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: i64,
    timestamp: DateTime<Utc>,
    actor: String,
    action: String,
    sku: Option<String>,
    location_id: Option<String>,
    quantity_before: Option<i32>,
    quantity_after: Option<i32>,
    reason: String,
    notes: Option<String>,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditRow) -> AppResult<Self> {
        Ok(AuditLogEntry {
            action: parse(&row.action)?,
            id: row.id,
            timestamp: row.timestamp,
            actor: row.actor,
            sku: row.sku,
            location_id: row.location_id,
            quantity_before: row.quantity_before,
            quantity_after: row.quantity_after,
            reason: row.reason,
            notes: row.notes,
        })
    }
}

#[derive(FromRow)]
struct ReportRow {
    id: i64,
    location_id: String,
    submitted_by: String,
    submitted_at: DateTime<Utc>,
    discrepancy_count: i32,
    applied: bool,
    notes: Option<String>,
}

impl ReportRow {
    fn with_lines(self, lines: Vec<ReconciliationLine>) -> ReconciliationReport {
        ReconciliationReport {
            id: self.id,
            location_id: self.location_id,
            submitted_by: self.submitted_by,
            submitted_at: self.submitted_at,
            discrepancy_count: self.discrepancy_count,
            applied: self.applied,
            notes: self.notes,
            lines,
        }
    }
}

#[derive(FromRow)]
struct LineRow {
    report_id: i64,
    sku: String,
    system_qty: i32,
    counted_qty: i32,
    difference: i32,
}

impl From<LineRow> for ReconciliationLine {
    fn from(row: LineRow) -> Self {
        ReconciliationLine {
            sku: row.sku,
            system_qty: row.system_qty,
            counted_qty: row.counted_qty,
            difference: row.difference,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const ITEM_COLUMNS: &str = "sku, description, category, species, dimensions, \
    farm_par_level, mke_par_level, status, created_at, updated_at";

const ALLOCATION_COLUMNS: &str = "id, project_id, sku, source_location, quantity, status, \
    allocated_by, created_at, updated_at";

const PICK_COLUMNS: &str = "id, project_id, allocation_id, sku, quantity_requested, \
    pick_from_location, quantity_picked, status, picked_by, pick_date, created_at";

const TRANSFER_COLUMNS: &str = "id, sku, quantity, from_location, to_location, status, \
    request_date, shipped_date, received_date, requested_by, received_by, quantity_received, notes";

const AUDIT_COLUMNS: &str = "id, timestamp, actor, action, sku, location_id, \
    quantity_before, quantity_after, reason, notes";

impl PgUnitOfWork {
    async fn lines_for(&mut self, report_ids: &[i64]) -> AppResult<Vec<LineRow>> {
        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT report_id, sku, system_qty, counted_qty, difference
            FROM reconciliation_lines
            WHERE report_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(report_ids)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn get_item(&mut self, sku: &str) -> AppResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM inventory_items WHERE sku = $1",
            ITEM_COLUMNS
        ))
        .bind(sku)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(InventoryItem::try_from).transpose()
    }

    async fn list_items(&mut self) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM inventory_items ORDER BY sku",
            ITEM_COLUMNS
        ))
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                sku, description, category, species, dimensions,
                farm_par_level, mke_par_level, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&item.sku)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.species)
        .bind(&item.dimensions)
        .bind(item.farm_par_level)
        .bind(item.mke_par_level)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_duplicate(e, "sku", format!("SKU {} already exists", item.sku)))?;
        Ok(())
    }

    async fn update_item(&mut self, item: &InventoryItem) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET description = $2, category = $3, species = $4, dimensions = $5,
                farm_par_level = $6, mke_par_level = $7, status = $8, updated_at = $9
            WHERE sku = $1
            "#,
        )
        .bind(&item.sku)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.species)
        .bind(&item.dimensions)
        .bind(item.farm_par_level)
        .bind(item.mke_par_level)
        .bind(item.status.as_str())
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {}", item.sku)));
        }
        Ok(())
    }

    async fn delete_item(&mut self, sku: &str) -> AppResult<bool> {
        // Stock, allocations, transfers and pick lists cascade
        let result = sqlx::query("DELETE FROM inventory_items WHERE sku = $1")
            .bind(sku)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_location(&mut self, location_id: &str) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT location_id, name, hub, zone_type FROM locations WHERE location_id = $1",
        )
        .bind(location_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Location::try_from).transpose()
    }

    async fn list_locations(&mut self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT location_id, name, hub, zone_type FROM locations ORDER BY location_id",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn upsert_location(&mut self, location: &Location) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (location_id, name, hub, zone_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (location_id) DO UPDATE
            SET name = EXCLUDED.name, hub = EXCLUDED.hub, zone_type = EXCLUDED.zone_type
            "#,
        )
        .bind(&location.location_id)
        .bind(&location.name)
        .bind(location.hub.as_str())
        .bind(location.zone_type.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_stock_level(
        &mut self,
        sku: &str,
        location_id: &str,
    ) -> AppResult<Option<StockLevel>> {
        let row = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT sku, location_id, quantity, last_counted, counted_by, updated_at
            FROM stock_levels
            WHERE sku = $1 AND location_id = $2
            FOR UPDATE
            "#,
        )
        .bind(sku)
        .bind(location_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(StockLevel::from))
    }

    async fn upsert_stock_level(&mut self, level: &StockLevel) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (sku, location_id, quantity, last_counted, counted_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (sku, location_id) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                last_counted = EXCLUDED.last_counted,
                counted_by = EXCLUDED.counted_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&level.sku)
        .bind(&level.location_id)
        .bind(level.quantity)
        .bind(level.last_counted)
        .bind(&level.counted_by)
        .bind(level.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_stock_levels(&mut self, sku: Option<&str>) -> AppResult<Vec<StockLevel>> {
        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT sku, location_id, quantity, last_counted, counted_by, updated_at
            FROM stock_levels
            WHERE ($1::text IS NULL OR sku = $1)
            ORDER BY sku, location_id
            "#,
        )
        .bind(sku)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(StockLevel::from).collect())
    }

    async fn get_project(&mut self, project_id: &str) -> AppResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT project_id, name, client, hub, status, lead, start_date, end_date, notes, created_at
            FROM projects
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Project::try_from).transpose()
    }

    async fn list_projects(&mut self) -> AppResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT project_id, name, client, hub, status, lead, start_date, end_date, notes, created_at
            FROM projects
            ORDER BY project_id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn insert_project(&mut self, project: &Project) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                project_id, name, client, hub, status, lead, start_date, end_date, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&project.project_id)
        .bind(&project.name)
        .bind(&project.client)
        .bind(project.hub.as_str())
        .bind(project.status.as_str())
        .bind(&project.lead)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.notes)
        .bind(project.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            conflict_on_duplicate(
                e,
                "project_id",
                format!("Project {} already exists", project.project_id),
            )
        })?;
        Ok(())
    }

    async fn update_project(&mut self, project: &Project) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = $2, client = $3, hub = $4, status = $5, lead = $6,
                start_date = $7, end_date = $8, notes = $9
            WHERE project_id = $1
            "#,
        )
        .bind(&project.project_id)
        .bind(&project.name)
        .bind(&project.client)
        .bind(project.hub.as_str())
        .bind(project.status.as_str())
        .bind(&project.lead)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.notes)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {}", project.project_id)));
        }
        Ok(())
    }

    async fn insert_allocation(&mut self, allocation: &NewAllocation) -> AppResult<Allocation> {
        let row = sqlx::query_as::<_, AllocationRow>(&format!(
            r#"
            INSERT INTO allocations (project_id, sku, source_location, quantity, status, allocated_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ALLOCATION_COLUMNS
        ))
        .bind(&allocation.project_id)
        .bind(&allocation.sku)
        .bind(&allocation.source_location)
        .bind(allocation.quantity)
        .bind(AllocationStatus::Reserved.as_str())
        .bind(&allocation.allocated_by)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn get_allocation(&mut self, id: i64) -> AppResult<Option<Allocation>> {
        let row = sqlx::query_as::<_, AllocationRow>(&format!(
            "SELECT {} FROM allocations WHERE id = $1 FOR UPDATE",
            ALLOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Allocation::try_from).transpose()
    }

    async fn list_allocations(&mut self, filter: &AllocationFilter) -> AppResult<Vec<Allocation>> {
        let rows = sqlx::query_as::<_, AllocationRow>(&format!(
            r#"
            SELECT {}
            FROM allocations
            WHERE ($1::text IS NULL OR project_id = $1)
              AND ($2::text IS NULL OR sku = $2)
              AND ($3::text IS NULL OR source_location = $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY id
            "#,
            ALLOCATION_COLUMNS
        ))
        .bind(filter.project_id.as_deref())
        .bind(filter.sku.as_deref())
        .bind(filter.source_location.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn set_allocation_status(&mut self, id: i64, status: AllocationStatus) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE allocations SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Allocation {}", id)));
        }
        Ok(())
    }

    async fn insert_pick_list(&mut self, pick: &NewPickList) -> AppResult<PickList> {
        let row = sqlx::query_as::<_, PickRow>(&format!(
            r#"
            INSERT INTO pick_lists (
                project_id, allocation_id, sku, quantity_requested, pick_from_location
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PICK_COLUMNS
        ))
        .bind(&pick.project_id)
        .bind(pick.allocation_id)
        .bind(&pick.sku)
        .bind(pick.quantity_requested)
        .bind(&pick.pick_from_location)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn get_pick_list(&mut self, id: i64) -> AppResult<Option<PickList>> {
        let row = sqlx::query_as::<_, PickRow>(&format!(
            "SELECT {} FROM pick_lists WHERE id = $1 FOR UPDATE",
            PICK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(PickList::try_from).transpose()
    }

    async fn list_pick_lists(&mut self, project_id: Option<&str>) -> AppResult<Vec<PickList>> {
        let rows = sqlx::query_as::<_, PickRow>(&format!(
            "SELECT {} FROM pick_lists WHERE ($1::text IS NULL OR project_id = $1) ORDER BY id",
            PICK_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn update_pick_list(&mut self, pick: &PickList) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pick_lists
            SET quantity_picked = $2, status = $3, picked_by = $4, pick_date = $5
            WHERE id = $1
            "#,
        )
        .bind(pick.id)
        .bind(pick.quantity_picked)
        .bind(pick.status.as_str())
        .bind(&pick.picked_by)
        .bind(pick.pick_date)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Pick list {}", pick.id)));
        }
        Ok(())
    }

    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
        requested_by: &str,
    ) -> AppResult<Transfer> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            INSERT INTO transfers (sku, quantity, from_location, to_location, status, requested_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TRANSFER_COLUMNS
        ))
        .bind(&transfer.sku)
        .bind(transfer.quantity)
        .bind(&transfer.from_location)
        .bind(&transfer.to_location)
        .bind(TransferStatus::Requested.as_str())
        .bind(requested_by)
        .bind(&transfer.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn get_transfer(&mut self, id: i64) -> AppResult<Option<Transfer>> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {} FROM transfers WHERE id = $1 FOR UPDATE",
            TRANSFER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(Transfer::try_from).transpose()
    }

    async fn list_transfers(&mut self, status: Option<TransferStatus>) -> AppResult<Vec<Transfer>> {
        let rows = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {} FROM transfers WHERE ($1::text IS NULL OR status = $1) ORDER BY id DESC",
            TRANSFER_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn update_transfer(&mut self, transfer: &Transfer) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = $2, shipped_date = $3, received_date = $4,
                received_by = $5, quantity_received = $6, notes = $7
            WHERE id = $1
            "#,
        )
        .bind(transfer.id)
        .bind(transfer.status.as_str())
        .bind(transfer.shipped_date)
        .bind(transfer.received_date)
        .bind(&transfer.received_by)
        .bind(transfer.quantity_received)
        .bind(&transfer.notes)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Transfer {}", transfer.id)));
        }
        Ok(())
    }

    async fn delete_transfer(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM transfers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_audit(&mut self, entry: &NewAuditEntry) -> AppResult<AuditLogEntry> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            r#"
            INSERT INTO audit_log (
                actor, action, sku, location_id, quantity_before, quantity_after, reason, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            AUDIT_COLUMNS
        ))
        .bind(&entry.actor)
        .bind(entry.action.as_str())
        .bind(&entry.sku)
        .bind(&entry.location_id)
        .bind(entry.quantity_before)
        .bind(entry.quantity_after)
        .bind(&entry.reason)
        .bind(&entry.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        row.try_into()
    }

    async fn list_audit(&mut self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            r#"
            SELECT {}
            FROM audit_log
            WHERE ($1::text IS NULL OR sku = $1)
              AND ($2::text IS NULL OR location_id = $2)
              AND ($3::text IS NULL OR action = $3)
            ORDER BY id DESC
            LIMIT $4
            "#,
            AUDIT_COLUMNS
        ))
        .bind(query.sku.as_deref())
        .bind(query.location_id.as_deref())
        .bind(query.action.map(|a| a.as_str()))
        .bind(i64::from(query.effective_limit()))
        .fetch_all(&mut *self.tx)
        .await?;
        convert_all(rows)
    }

    async fn insert_reconciliation(
        &mut self,
        report: &NewReconciliation,
    ) -> AppResult<ReconciliationReport> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO reconciliation_reports (location_id, submitted_by, discrepancy_count, applied, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, location_id, submitted_by, submitted_at, discrepancy_count, applied, notes
            "#,
        )
        .bind(&report.location_id)
        .bind(&report.submitted_by)
        .bind(report.discrepancy_count())
        .bind(report.applied)
        .bind(&report.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        for line in &report.lines {
            sqlx::query(
                r#"
                INSERT INTO reconciliation_lines (report_id, sku, system_qty, counted_qty, difference)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(row.id)
            .bind(&line.sku)
            .bind(line.system_qty)
            .bind(line.counted_qty)
            .bind(line.difference)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(row.with_lines(report.lines.clone()))
    }

    async fn get_reconciliation(&mut self, id: i64) -> AppResult<Option<ReconciliationReport>> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, location_id, submitted_by, submitted_at, discrepancy_count, applied, notes
            FROM reconciliation_reports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => {
                let lines = self.lines_for(&[row.id]).await?;
                Ok(Some(
                    row.with_lines(lines.into_iter().map(ReconciliationLine::from).collect()),
                ))
            }
            None => Ok(None),
        }
    }

    async fn list_reconciliations(
        &mut self,
        location_id: Option<&str>,
    ) -> AppResult<Vec<ReconciliationReport>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, location_id, submitted_by, submitted_at, discrepancy_count, applied, notes
            FROM reconciliation_reports
            WHERE ($1::text IS NULL OR location_id = $1)
            ORDER BY id DESC
            "#,
        )
        .bind(location_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.lines_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (mine, rest): (Vec<LineRow>, Vec<LineRow>) =
                    lines.drain(..).partition(|l| l.report_id == row.id);
                lines = rest;
                row.with_lines(mine.into_iter().map(ReconciliationLine::from).collect())
            })
            .collect())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
