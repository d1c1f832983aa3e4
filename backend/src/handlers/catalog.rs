//! HTTP handlers for catalog lookups (read-only)

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::CatalogService;
use crate::AppState;
use shared::{StockItem, Warehouse};

/// List catalog items
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockItem>>> {
    let service = CatalogService::new(state.db);
    let items = service.list_items().await?;
    Ok(Json(items))
}

/// Get one catalog item
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<StockItem>> {
    let service = CatalogService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// List warehouses
pub async fn list_warehouses(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Warehouse>>> {
    let service = CatalogService::new(state.db);
    let warehouses = service.list_warehouses().await?;
    Ok(Json(warehouses))
}
