//! HTTP handlers for allocations

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{Allocation, AllocationFilter};

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::AllocationService;
use crate::AppState;

/// List allocations filtered by project, SKU, location or status
pub async fn list_allocations(
    State(state): State<AppState>,
    Query(filter): Query<AllocationFilter>,
) -> AppResult<Json<Vec<Allocation>>> {
    let service = AllocationService::new(state.store);
    Ok(Json(service.list(&filter).await?))
}

/// Release a reservation
pub async fn cancel_allocation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Allocation>> {
    let service = AllocationService::new(state.store);
    Ok(Json(service.cancel(&actor, id).await?))
}
