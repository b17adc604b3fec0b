//! HTTP handlers for transfers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{NewTransfer, Transfer, TransferStatus};

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::transfers::ReceiveTransferInput;
use crate::services::TransferService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransferListQuery {
    pub status: Option<TransferStatus>,
}

/// List transfers, newest first
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<TransferListQuery>,
) -> AppResult<Json<Vec<Transfer>>> {
    let service = TransferService::new(state.store, state.notifier);
    Ok(Json(service.list(query.status).await?))
}

/// Request a transfer
pub async fn create_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewTransfer>,
) -> impl IntoResponse {
    let service = TransferService::new(state.store, state.notifier);

    match service.create(&actor, input).await {
        Ok(transfer) => (StatusCode::CREATED, Json(transfer)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get one transfer
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.store, state.notifier);
    Ok(Json(service.get(id).await?))
}

/// Ship a requested transfer
pub async fn ship_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.store, state.notifier);
    Ok(Json(service.ship(&actor, id).await?))
}

/// Receive an in-transit transfer
pub async fn receive_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    input: Option<Json<ReceiveTransferInput>>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.store, state.notifier);
    let input = input.map(|Json(i)| i).unwrap_or_default();
    Ok(Json(service.receive(&actor, id, input).await?))
}

/// Cancel a transfer
pub async fn cancel_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> AppResult<Json<Transfer>> {
    let service = TransferService::new(state.store, state.notifier);
    Ok(Json(service.cancel(&actor, id).await?))
}

/// Delete a transfer
pub async fn delete_transfer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let service = TransferService::new(state.store, state.notifier);

    match service.delete(&actor, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
