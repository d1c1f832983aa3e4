//! HTTP handlers for stock ledger reads

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{StockService, WarehouseStockDetail};
use crate::AppState;

/// Query parameters for the stock listing
#[derive(Debug, Deserialize)]
pub struct StockListQuery {
    pub warehouse_id: Uuid,
}

/// List ledger rows at a warehouse
pub async fn list_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<StockListQuery>,
) -> AppResult<Json<Vec<WarehouseStockDetail>>> {
    let service = StockService::new(state.db);
    let rows = service.list_by_warehouse(query.warehouse_id).await?;
    Ok(Json(rows))
}

/// Book quantity for one (item, warehouse) pair
#[derive(Debug, Serialize)]
pub struct StockQuantityResponse {
    pub item_id: Uuid,
    pub warehouse_id: Uuid,
    pub current_quantity: Decimal,
}

/// Read one pair's book quantity
///
/// A pair without ledger history reads as zero.
pub async fn get_stock_pair(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((item_id, warehouse_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<StockQuantityResponse>> {
    let service = StockService::new(state.db);
    let current_quantity = service.get_quantity(item_id, warehouse_id).await?;

    Ok(Json(StockQuantityResponse {
        item_id,
        warehouse_id,
        current_quantity,
    }))
}
