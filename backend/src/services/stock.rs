//! Warehouse stock store: the quantity ledger
//!
//! Single source of truth for book quantities. Reads go through the pool;
//! mutations only happen on a caller-owned transaction so the processor
//! can lock, validate and apply as one atomic unit. Pair rows are never
//! deleted; a drained pair stays at zero.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Stock ledger read interface
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Ledger row joined with catalog metadata for listing screens
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseStockDetail {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_type: String,
    pub unit: String,
    pub warehouse_id: Uuid,
    pub current_quantity: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Book quantity for one pair; a pair without ledger history reads
    /// as zero
    pub async fn get_quantity(&self, item_id: Uuid, warehouse_id: Uuid) -> AppResult<Decimal> {
        let quantity = sqlx::query_scalar::<_, Decimal>(
            "SELECT current_quantity FROM warehouse_stocks WHERE item_id = $1 AND warehouse_id = $2",
        )
        .bind(item_id)
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(quantity.unwrap_or(Decimal::ZERO))
    }

    /// All ledger rows at a warehouse with item metadata
    pub async fn list_by_warehouse(
        &self,
        warehouse_id: Uuid,
    ) -> AppResult<Vec<WarehouseStockDetail>> {
        let rows = sqlx::query_as::<_, WarehouseStockDetail>(
            r#"
            SELECT ws.item_id, si.name AS item_name, si.item_type, si.unit,
                   ws.warehouse_id, ws.current_quantity, ws.last_updated
            FROM warehouse_stocks ws
            JOIN stock_items si ON si.id = ws.item_id
            WHERE ws.warehouse_id = $1
            ORDER BY si.name
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

}

/// Lock a set of (item, warehouse) pairs and return their quantities
///
/// Inserts a zero row for any pair the ledger has not seen yet, then takes
/// row locks in sorted pair order so concurrent batches cannot deadlock or
/// both pass a sufficiency check against a stale quantity.
pub async fn lock_quantities(
    conn: &mut PgConnection,
    pairs: &[(Uuid, Uuid)],
) -> AppResult<HashMap<(Uuid, Uuid), Decimal>> {
    let mut ordered = pairs.to_vec();
    ordered.sort();
    ordered.dedup();

    let mut locked = HashMap::with_capacity(ordered.len());
    for (item_id, warehouse_id) in ordered {
        sqlx::query(
            r#"
            INSERT INTO warehouse_stocks (item_id, warehouse_id, current_quantity)
            VALUES ($1, $2, 0)
            ON CONFLICT (item_id, warehouse_id) DO NOTHING
            "#,
        )
        .bind(item_id)
        .bind(warehouse_id)
        .execute(&mut *conn)
        .await?;

        let quantity = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT current_quantity FROM warehouse_stocks
            WHERE item_id = $1 AND warehouse_id = $2
            FOR UPDATE
            "#,
        )
        .bind(item_id)
        .bind(warehouse_id)
        .fetch_one(&mut *conn)
        .await?;

        locked.insert((item_id, warehouse_id), quantity);
    }

    Ok(locked)
}

/// Apply a signed delta to a locked pair and return the new quantity
pub async fn apply_delta(
    conn: &mut PgConnection,
    item_id: Uuid,
    warehouse_id: Uuid,
    delta: Decimal,
) -> AppResult<Decimal> {
    let new_quantity = sqlx::query_scalar::<_, Decimal>(
        r#"
        UPDATE warehouse_stocks
        SET current_quantity = current_quantity + $3, last_updated = NOW()
        WHERE item_id = $1 AND warehouse_id = $2
        RETURNING current_quantity
        "#,
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(delta)
    .fetch_one(&mut *conn)
    .await?;

    Ok(new_quantity)
}

/// Overwrite a locked pair's quantity with an authoritative counted value
///
/// Only audit adjustments use this; normal transactions are delta-based.
pub async fn set_absolute(
    conn: &mut PgConnection,
    item_id: Uuid,
    warehouse_id: Uuid,
    value: Decimal,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE warehouse_stocks
        SET current_quantity = $3, last_updated = NOW()
        WHERE item_id = $1 AND warehouse_id = $2
        "#,
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(value)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
