//! Catalog adapter: read-only access to items and warehouses
//!
//! Item and warehouse CRUD belongs to the back-office screens outside
//! this service. The ledger core only resolves references through here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{ItemType, StockItem, Warehouse};

/// Read-only catalog lookups
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Row for catalog item queries
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    item_type: String,
    unit: String,
    stock_grade: String,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> AppResult<StockItem> {
        let item_type = ItemType::parse(&self.item_type)
            .ok_or_else(|| AppError::Internal(format!("Unknown item type: {}", self.item_type)))?;
        Ok(StockItem {
            id: self.id,
            name: self.name,
            item_type,
            unit: self.unit,
            stock_grade: self.stock_grade,
            created_at: self.created_at,
        })
    }
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all catalog items
    pub async fn list_items(&self) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, item_type, unit, stock_grade, created_at
            FROM stock_items
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Get one catalog item
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, item_type, unit, stock_grade, created_at
            FROM stock_items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

        row.into_item()
    }

    /// Resolve a set of item references, failing on the first unknown id
    ///
    /// Used by the transaction processor so a cart naming a deleted item
    /// is rejected before any ledger mutation.
    pub async fn resolve_items(&self, item_ids: &[Uuid]) -> AppResult<HashMap<Uuid, StockItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, name, item_type, unit, stock_grade, created_at
            FROM stock_items
            WHERE id = ANY($1)
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.db)
        .await?;

        let mut resolved = HashMap::with_capacity(rows.len());
        for row in rows {
            let item = row.into_item()?;
            resolved.insert(item.id, item);
        }

        for id in item_ids {
            if !resolved.contains_key(id) {
                return Err(AppError::NotFound(format!("Stock item {}", id)));
            }
        }

        Ok(resolved)
    }

    /// List all warehouses
    pub async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "SELECT id, name, created_at FROM warehouses ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(id, name, created_at)| Warehouse {
            id,
            name,
            created_at,
        })
        .collect();

        Ok(warehouses)
    }

    /// Get one warehouse
    pub async fn get_warehouse(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            "SELECT id, name, created_at FROM warehouses WHERE id = $1",
        )
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        Ok(Warehouse {
            id: row.0,
            name: row.1,
            created_at: row.2,
        })
    }

    /// Verify that every referenced warehouse exists
    pub async fn validate_warehouses(&self, warehouse_ids: &[Uuid]) -> AppResult<()> {
        let mut unique = warehouse_ids.to_vec();
        unique.sort();
        unique.dedup();

        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM warehouses WHERE id = ANY($1)",
        )
        .bind(&unique)
        .fetch_one(&self.db)
        .await?;

        if known as usize != unique.len() {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }
        Ok(())
    }
}
