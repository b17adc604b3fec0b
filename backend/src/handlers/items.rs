//! HTTP handlers for catalog items

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{InventoryItem, ItemStock, ItemUpdate, NewItem};

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::{CatalogService, LedgerService};
use crate::AppState;

/// List all catalog items
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<InventoryItem>>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.list_items().await?))
}

/// Create a catalog item
pub async fn create_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewItem>,
) -> impl IntoResponse {
    let service = CatalogService::new(state.store);

    match service.create_item(&actor, input).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get one catalog item
pub async fn get_item(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<InventoryItem>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.get_item(&sku).await?))
}

/// Get an item with its stock at every location
pub async fn get_item_stock(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<ItemStock>> {
    let service = LedgerService::new(state.store);
    Ok(Json(service.stock_for_item(&sku).await?))
}

/// Update a catalog item
pub async fn update_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(sku): Path<String>,
    Json(update): Json<ItemUpdate>,
) -> AppResult<Json<InventoryItem>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.update_item(&actor, &sku, update).await?))
}

/// Delete a catalog item and everything recorded against it
pub async fn delete_item(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(sku): Path<String>,
) -> impl IntoResponse {
    let service = CatalogService::new(state.store);

    match service.delete_item(&actor, &sku).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
