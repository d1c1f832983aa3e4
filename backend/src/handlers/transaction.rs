//! HTTP handlers for batch transaction processing

use axum::{
    extract::{Query, State},
    Json,
};
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::transaction::{
    BatchTransactionInput, TransactionFilter, TransactionService,
};
use crate::AppState;
use shared::StockTransaction;

/// Submit a cart as one atomic transaction batch
pub async fn create_transaction_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BatchTransactionInput>,
) -> AppResult<Json<Vec<StockTransaction>>> {
    if !current_user.0.has_permission("stock", "write") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = TransactionService::new(state.db);
    let created = service.process_batch(current_user.0.user_id, input).await?;
    Ok(Json(created))
}

/// Transaction history with optional filters
pub async fn list_transactions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<Vec<StockTransaction>>> {
    let service = TransactionService::new(state.db);
    let transactions = service.list_transactions(filter).await?;
    Ok(Json(transactions))
}
