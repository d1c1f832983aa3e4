//! Route definitions for the Resto Stock back-office

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - catalog lookups
        .nest("/items", item_routes())
        .nest("/warehouses", warehouse_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - transaction processing
        .nest("/transactions", transaction_routes())
        // Protected routes - audit reconciliation
        .nest("/audits", audit_routes())
}

/// Catalog item routes (protected, read-only)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items))
        .route("/:item_id", get(handlers::get_item))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Warehouse routes (protected, read-only)
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_warehouses))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock))
        .route("/:item_id/:warehouse_id", get(handlers::get_stock_pair))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Transaction processing routes (protected)
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transactions).post(handlers::create_transaction_batch),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Audit reconciliation routes (protected)
fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_audits).post(handlers::create_audit))
        .route(
            "/:audit_id",
            get(handlers::get_audit_detail).delete(handlers::delete_audit),
        )
        .route("/:audit_id/items", patch(handlers::update_audit_items))
        .route("/:audit_id/complete", post(handlers::complete_audit))
        .route_layer(middleware::from_fn(auth_middleware))
}
