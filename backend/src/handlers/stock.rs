//! HTTP handlers for locations and the stock ledger

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{Location, StockLevel};

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::allocations::Availability;
use crate::services::ledger::{AdjustStockInput, RecordCountInput, StockChange};
use crate::services::{AllocationService, CatalogService, LedgerService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub sku: String,
    pub location_id: String,
}

/// List all locations
pub async fn list_locations(State(state): State<AppState>) -> AppResult<Json<Vec<Location>>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.list_locations().await?))
}

/// List ledger rows, optionally for one SKU
pub async fn list_stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let service = LedgerService::new(state.store);
    Ok(Json(service.list_stock(query.sku.as_deref()).await?))
}

/// Set an absolute on-hand quantity
pub async fn adjust_stock(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockChange>> {
    let service = LedgerService::new(state.store);
    Ok(Json(service.adjust_stock(&actor, input).await?))
}

/// Record a physical count for one SKU at one location
pub async fn record_count(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<RecordCountInput>,
) -> AppResult<Json<StockChange>> {
    let service = LedgerService::new(state.store);
    Ok(Json(service.record_count(&actor, input).await?))
}

/// On-hand minus open reservations
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    let service = AllocationService::new(state.store);
    Ok(Json(
        service.available(&query.sku, &query.location_id).await?,
    ))
}
