//! HTTP handlers for projects, clients and project-scoped allocation work

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{
    Allocation, AllocationFilter, AllocationRequest, BulkAllocationResult, ClientSummary,
    NewProject, PickList, Project,
};

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::catalog::ProjectStatusInput;
use crate::services::{AllocationService, CatalogService, PickingService};
use crate::AppState;

/// List all projects
pub async fn list_projects(State(state): State<AppState>) -> AppResult<Json<Vec<Project>>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.list_projects().await?))
}

/// Create a project with the next PRJ-NNN id
pub async fn create_project(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewProject>,
) -> impl IntoResponse {
    let service = CatalogService::new(state.store);

    match service.create_project(&actor, input).await {
        Ok(project) => (StatusCode::CREATED, Json(project)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get one project
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<Project>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.get_project(&project_id).await?))
}

/// Change a project's status
pub async fn update_project_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(project_id): Path<String>,
    Json(input): Json<ProjectStatusInput>,
) -> AppResult<Json<Project>> {
    let service = CatalogService::new(state.store);
    Ok(Json(
        service
            .update_project_status(&actor, &project_id, input.status)
            .await?,
    ))
}

/// Projects grouped by client
pub async fn list_clients(State(state): State<AppState>) -> AppResult<Json<Vec<ClientSummary>>> {
    let service = CatalogService::new(state.store);
    Ok(Json(service.list_clients().await?))
}

/// Every allocation for a project, oldest first
pub async fn list_project_allocations(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<Vec<Allocation>>> {
    let service = AllocationService::new(state.store);
    let filter = AllocationFilter {
        project_id: Some(project_id),
        ..Default::default()
    };
    Ok(Json(service.list(&filter).await?))
}

/// Reserve stock for a project
pub async fn allocate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(project_id): Path<String>,
    Json(request): Json<AllocationRequest>,
) -> impl IntoResponse {
    let service = AllocationService::new(state.store);

    match service.allocate(&actor, &project_id, &request).await {
        Ok(allocation) => (StatusCode::CREATED, Json(allocation)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reserve many rows at once; failures are reported per row
pub async fn bulk_allocate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(project_id): Path<String>,
    Json(rows): Json<Vec<AllocationRequest>>,
) -> AppResult<Json<BulkAllocationResult>> {
    let service = AllocationService::new(state.store);
    Ok(Json(
        service.bulk_allocate(&actor, &project_id, &rows).await?,
    ))
}

/// Generate pick lists from the project's reservations
pub async fn generate_pick_lists(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(project_id): Path<String>,
) -> impl IntoResponse {
    let service = PickingService::new(state.store);

    match service.generate(&actor, &project_id).await {
        Ok(picks) => (StatusCode::CREATED, Json::<Vec<PickList>>(picks)).into_response(),
        Err(e) => e.into_response(),
    }
}
