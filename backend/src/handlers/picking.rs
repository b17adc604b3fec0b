//! HTTP handlers for pick lists

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::PickList;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::picking::ConfirmPickInput;
use crate::services::PickingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PickListQuery {
    pub project_id: Option<String>,
}

/// List pick lists, optionally for one project
pub async fn list_pick_lists(
    State(state): State<AppState>,
    Query(query): Query<PickListQuery>,
) -> AppResult<Json<Vec<PickList>>> {
    let service = PickingService::new(state.store);
    Ok(Json(service.list(query.project_id.as_deref()).await?))
}

/// Start working a pick
pub async fn start_pick(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<PickList>> {
    let service = PickingService::new(state.store);
    Ok(Json(service.start(&actor, id).await?))
}

/// Confirm the quantity picked
pub async fn confirm_pick(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(input): Json<ConfirmPickInput>,
) -> AppResult<Json<PickList>> {
    let service = PickingService::new(state.store);
    Ok(Json(service.confirm_pick(&actor, id, input).await?))
}

/// Cancel a pick
pub async fn cancel_pick(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<PickList>> {
    let service = PickingService::new(state.store);
    Ok(Json(service.cancel(&actor, id).await?))
}
