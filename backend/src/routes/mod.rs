//! Route definitions for the Lumber Inventory Platform
//!
//! Reads are open; every mutating route takes a `CurrentActor` and rejects
//! requests without a verified actor identity.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog
        .nest("/items", item_routes())
        .route("/locations", get(handlers::list_locations))
        // Ledger
        .nest("/stock", stock_routes())
        // Projects and clients
        .nest("/projects", project_routes())
        .route("/clients", get(handlers::list_clients))
        // Workflows
        .nest("/allocations", allocation_routes())
        .nest("/pick-lists", pick_list_routes())
        .nest("/transfers", transfer_routes())
        .nest("/reconciliations", reconciliation_routes())
        // Reporting
        .route("/alerts/below-par", get(handlers::get_below_par_alerts))
        .route("/audit", get(handlers::list_audit))
}

/// Catalog item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:sku",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/:sku/stock", get(handlers::get_item_stock))
}

/// Stock ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock))
        .route("/adjust", post(handlers::adjust_stock))
        .route("/count", post(handlers::record_count))
        .route("/available", get(handlers::get_availability))
}

/// Project routes
fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_projects).post(handlers::create_project))
        .route("/:project_id", get(handlers::get_project))
        .route("/:project_id/status", put(handlers::update_project_status))
        .route(
            "/:project_id/allocations",
            get(handlers::list_project_allocations).post(handlers::allocate),
        )
        .route("/:project_id/allocations/bulk", post(handlers::bulk_allocate))
        .route("/:project_id/pick-lists", post(handlers::generate_pick_lists))
}

/// Allocation routes
fn allocation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_allocations))
        .route("/:id/cancel", post(handlers::cancel_allocation))
}

/// Pick list routes
fn pick_list_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_pick_lists))
        .route("/:id/start", post(handlers::start_pick))
        .route("/:id/confirm", post(handlers::confirm_pick))
        .route("/:id/cancel", post(handlers::cancel_pick))
}

/// Transfer routes
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transfers).post(handlers::create_transfer))
        .route(
            "/:id",
            get(handlers::get_transfer).delete(handlers::delete_transfer),
        )
        .route("/:id/ship", post(handlers::ship_transfer))
        .route("/:id/receive", post(handlers::receive_transfer))
        .route("/:id/cancel", post(handlers::cancel_transfer))
}

/// Reconciliation routes
fn reconciliation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_reconciliations).post(handlers::submit_reconciliation),
        )
        .route("/:id", get(handlers::get_reconciliation))
}
