//! Audit manager: physical count reconciliation
//!
//! An audit snapshots book quantities for a filtered slice of the catalog
//! at one warehouse, collects counted quantities over time through batch
//! updates, and on completion optionally reconciles the ledger to the
//! counted values through adjustment transactions.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{
    catalog::CatalogService,
    stock,
    transaction::{insert_transaction, PlannedEntry},
};
use shared::{
    derive_item_status, validate_counted_quantity, validate_name, AuditItemStatus, AuditStats,
    AuditStatus, BatchUpdateRequest, ItemType, Pagination, PaginatedResponse, PaginationMeta,
    StockAudit, TransactionType, Warehouse,
};

/// Audit lifecycle service
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

/// Input for creating an audit
#[derive(Debug, Deserialize)]
pub struct CreateAuditInput {
    pub name: String,
    pub description: Option<String>,
    pub audit_date: NaiveDate,
    pub warehouse_id: Uuid,
    #[serde(default)]
    pub item_types: Vec<ItemType>,
    #[serde(default)]
    pub stock_grades: Vec<String>,
}

/// Query parameters for the audit detail page
#[derive(Debug, Default, Deserialize)]
pub struct AuditDetailQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub item_type: Option<ItemType>,
    pub search: Option<String>,
}

/// Audit item joined with catalog metadata, status derived
#[derive(Debug, Clone, Serialize)]
pub struct AuditItemDetail {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_type: ItemType,
    pub unit: String,
    pub book_quantity: Decimal,
    pub actual_quantity: Option<Decimal>,
    pub notes: Option<String>,
    pub version: i32,
    pub status: AuditItemStatus,
}

/// Full audit detail response
#[derive(Debug, Serialize)]
pub struct AuditDetail {
    pub audit: StockAudit,
    pub warehouse: Warehouse,
    pub items: Vec<AuditItemDetail>,
    pub stats: AuditStats,
    pub pagination: PaginationMeta,
}

/// Row for audit queries
#[derive(Debug, FromRow)]
struct AuditRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    status: String,
    warehouse_id: Uuid,
    audit_date: NaiveDate,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl AuditRow {
    fn into_audit(self) -> AppResult<StockAudit> {
        let status = AuditStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown audit status: {}", self.status)))?;
        Ok(StockAudit {
            id: self.id,
            name: self.name,
            description: self.description,
            status,
            warehouse_id: self.warehouse_id,
            audit_date: self.audit_date,
            created_by: self.created_by,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

/// Row for audit item queries
#[derive(Debug, FromRow)]
struct AuditItemRow {
    id: Uuid,
    item_id: Uuid,
    item_name: String,
    item_type: String,
    unit: String,
    book_quantity: Decimal,
    actual_quantity: Option<Decimal>,
    notes: Option<String>,
    version: i32,
}

impl AuditItemRow {
    fn into_detail(self) -> AppResult<AuditItemDetail> {
        let item_type = ItemType::parse(&self.item_type)
            .ok_or_else(|| AppError::Internal(format!("Unknown item type: {}", self.item_type)))?;
        let status = derive_item_status(self.book_quantity, self.actual_quantity);
        Ok(AuditItemDetail {
            id: self.id,
            item_id: self.item_id,
            item_name: self.item_name,
            item_type,
            unit: self.unit,
            book_quantity: self.book_quantity,
            actual_quantity: self.actual_quantity,
            notes: self.notes,
            version: self.version,
            status,
        })
    }
}

/// Plan the adjustment entries for audit completion
///
/// The delta is computed against the live locked quantity rather than the
/// audit snapshot: the counted value is authoritative for where the ledger
/// ends up, and a delta relative to the live value keeps the
/// sum-of-deltas invariant intact even when other transactions ran while
/// the count was underway.
/// Guard for operations only valid while the audit is in progress
///
/// `completed` is terminal: once there, the audit can never be edited,
/// completed again or deleted.
pub fn ensure_in_progress(status: AuditStatus, action: &str) -> AppResult<()> {
    match status {
        AuditStatus::InProgress => Ok(()),
        AuditStatus::Completed => Err(AppError::InvalidState(format!(
            "Audit is already completed and cannot be {}",
            action
        ))),
    }
}

/// Optimistic-concurrency rule for batch item updates
///
/// A change carrying no base version is last-write-wins; a carried
/// version must match the stored one exactly.
pub fn check_base_version(
    audit_item_id: Uuid,
    base_version: Option<i32>,
    current_version: i32,
) -> AppResult<()> {
    if let Some(base) = base_version {
        if base != current_version {
            return Err(AppError::Conflict {
                resource: format!("audit_item:{}", audit_item_id),
                message: format!(
                    "Item was changed by another operator (expected version {}, found {})",
                    base, current_version
                ),
            });
        }
    }
    Ok(())
}

pub fn plan_adjustments(
    warehouse_id: Uuid,
    counted: &[(Uuid, Decimal)],
    live: &HashMap<(Uuid, Uuid), Decimal>,
) -> Vec<PlannedEntry> {
    counted
        .iter()
        .map(|(item_id, actual)| {
            let current = live
                .get(&(*item_id, warehouse_id))
                .copied()
                .unwrap_or(Decimal::ZERO);
            PlannedEntry {
                item_id: *item_id,
                warehouse_id,
                transaction_type: TransactionType::Adjustment,
                quantity_delta: *actual - current,
                linked_transfer_id: None,
            }
        })
        .collect()
}

impl AuditService {
    /// Create a new AuditService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an audit and snapshot book quantities for matching items
    ///
    /// A filter matching zero items still creates the audit, empty.
    pub async fn create_audit(
        &self,
        actor_id: Uuid,
        input: CreateAuditInput,
    ) -> AppResult<(StockAudit, u64)> {
        validate_name(&input.name).map_err(|message| AppError::Validation {
            field: "name".to_string(),
            message: message.to_string(),
        })?;

        let catalog = CatalogService::new(self.db.clone());
        catalog.get_warehouse(input.warehouse_id).await?;

        let types: Vec<String> = input
            .item_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();

        let mut tx = self.db.begin().await?;

        let audit = sqlx::query_as::<_, AuditRow>(
            r#"
            INSERT INTO stock_audits (name, description, status, warehouse_id, audit_date, created_by)
            VALUES ($1, $2, 'in_progress', $3, $4, $5)
            RETURNING id, name, description, status, warehouse_id, audit_date,
                      created_by, created_at, completed_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.warehouse_id)
        .bind(input.audit_date)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?
        .into_audit()?;

        // Snapshot the book quantity of every matching item in one
        // statement so the snapshot is consistent with itself.
        let inserted = sqlx::query(
            r#"
            INSERT INTO stock_audit_items (audit_id, item_id, item_type, book_quantity)
            SELECT $1, si.id, si.item_type, COALESCE(ws.current_quantity, 0)
            FROM stock_items si
            LEFT JOIN warehouse_stocks ws
                   ON ws.item_id = si.id AND ws.warehouse_id = $2
            WHERE (cardinality($3::text[]) = 0 OR si.item_type = ANY($3))
              AND (cardinality($4::text[]) = 0 OR si.stock_grade = ANY($4))
            "#,
        )
        .bind(audit.id)
        .bind(input.warehouse_id)
        .bind(&types)
        .bind(&input.stock_grades)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::info!(audit_id = %audit.id, items = inserted, "Created stock audit");

        Ok((audit, inserted))
    }

    /// Audit header by id
    pub async fn get_audit(&self, audit_id: Uuid) -> AppResult<StockAudit> {
        let row = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, name, description, status, warehouse_id, audit_date,
                   created_by, created_at, completed_at
            FROM stock_audits
            WHERE id = $1
            "#,
        )
        .bind(audit_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Audit".to_string()))?;

        row.into_audit()
    }

    /// List audits, newest first
    pub async fn list_audits(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<StockAudit>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_audits")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, name, description, status, warehouse_id, audit_date,
                   created_by, created_at, completed_at
            FROM stock_audits
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(AuditRow::into_audit)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }

    /// One page of audit items plus whole-audit stats
    ///
    /// Stats always cover every item of the audit; only the item page is
    /// cut down by pagination and filters.
    pub async fn get_audit_detail(
        &self,
        audit_id: Uuid,
        query: AuditDetailQuery,
    ) -> AppResult<AuditDetail> {
        let audit = self.get_audit(audit_id).await?;
        let warehouse = CatalogService::new(self.db.clone())
            .get_warehouse(audit.warehouse_id)
            .await?;

        let stats = self.get_stats(audit_id).await?;

        let pagination = Pagination {
            page: query.page.unwrap_or(1),
            per_page: query.page_size.unwrap_or(50),
        }
        .clamped();

        let type_str = query.item_type.map(|t| t.as_str().to_string());
        let search = query
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s.trim()));

        let filtered_total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_audit_items ai
            JOIN stock_items si ON si.id = ai.item_id
            WHERE ai.audit_id = $1
              AND ($2::text IS NULL OR ai.item_type = $2)
              AND ($3::text IS NULL OR si.name ILIKE $3)
            "#,
        )
        .bind(audit_id)
        .bind(&type_str)
        .bind(&search)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, AuditItemRow>(
            r#"
            SELECT ai.id, ai.item_id, si.name AS item_name, ai.item_type, si.unit,
                   ai.book_quantity, ai.actual_quantity, ai.notes, ai.version
            FROM stock_audit_items ai
            JOIN stock_items si ON si.id = ai.item_id
            WHERE ai.audit_id = $1
              AND ($2::text IS NULL OR ai.item_type = $2)
              AND ($3::text IS NULL OR si.name ILIKE $3)
            ORDER BY si.name
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(audit_id)
        .bind(&type_str)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(AuditItemRow::into_detail)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(AuditDetail {
            audit,
            warehouse,
            items,
            stats,
            pagination: PaginationMeta::new(pagination, filtered_total as u64),
        })
    }

    /// Whole-audit progress counters, independent of pagination
    async fn get_stats(&self, audit_id: Uuid) -> AppResult<AuditStats> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE actual_quantity IS NULL),
                   COUNT(*) FILTER (WHERE actual_quantity = book_quantity),
                   COUNT(*) FILTER (WHERE actual_quantity IS NOT NULL
                                      AND actual_quantity <> book_quantity)
            FROM stock_audit_items
            WHERE audit_id = $1
            "#,
        )
        .bind(audit_id)
        .fetch_one(&self.db)
        .await?;

        Ok(AuditStats {
            total: row.0,
            pending: row.1,
            counted: row.2,
            discrepancy: row.3,
        })
    }

    /// Apply a committed edit buffer to the audit's items, all or nothing
    ///
    /// Rejected in full when the audit is not in progress, when any item
    /// id is unknown or foreign, or when a supplied base version is stale.
    pub async fn commit_batch(
        &self,
        audit_id: Uuid,
        request: BatchUpdateRequest,
    ) -> AppResult<u64> {
        if request.updates.is_empty() {
            return Err(AppError::Validation {
                field: "updates".to_string(),
                message: "Batch update must contain at least one change".to_string(),
            });
        }

        for change in request.updates.values() {
            if let Some(actual) = change.actual_quantity {
                validate_counted_quantity(actual).map_err(|message| AppError::Validation {
                    field: "actual_quantity".to_string(),
                    message: message.to_string(),
                })?;
            }
        }

        let mut tx = self.db.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM stock_audits WHERE id = $1 FOR UPDATE",
        )
        .bind(audit_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Audit".to_string()))?;

        let status = AuditStatus::parse(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown audit status: {}", status)))?;
        ensure_in_progress(status, "edited")?;

        // Deterministic order so concurrent commits cannot deadlock
        let mut entries: Vec<_> = request.updates.iter().collect();
        entries.sort_by_key(|(id, _)| **id);

        let mut updated = 0u64;
        for (audit_item_id, change) in entries {
            if change.is_empty() {
                continue;
            }

            let version = sqlx::query_scalar::<_, i32>(
                r#"
                SELECT version FROM stock_audit_items
                WHERE id = $1 AND audit_id = $2
                FOR UPDATE
                "#,
            )
            .bind(audit_item_id)
            .bind(audit_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Audit item {}", audit_item_id)))?;

            check_base_version(*audit_item_id, change.base_version, version)?;

            sqlx::query(
                r#"
                UPDATE stock_audit_items
                SET actual_quantity = COALESCE($3, actual_quantity),
                    notes = COALESCE($4, notes),
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $1 AND audit_id = $2
                "#,
            )
            .bind(audit_item_id)
            .bind(audit_id)
            .bind(change.actual_quantity)
            .bind(&change.notes)
            .execute(&mut *tx)
            .await?;

            updated += 1;
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Complete the audit, optionally reconciling the ledger to the counts
    ///
    /// The apply-or-not choice is made exactly once; a second completion
    /// attempt fails with an invalid-state error.
    pub async fn complete(
        &self,
        actor_id: Uuid,
        audit_id: Uuid,
        apply_differences: bool,
    ) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;

        let audit = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, name, description, status, warehouse_id, audit_date,
                   created_by, created_at, completed_at
            FROM stock_audits
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(audit_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Audit".to_string()))?
        .into_audit()?;

        ensure_in_progress(audit.status, "completed again")?;

        let mut applied = 0u64;
        if apply_differences {
            let counted = sqlx::query_as::<_, (Uuid, Decimal)>(
                r#"
                SELECT item_id, actual_quantity
                FROM stock_audit_items
                WHERE audit_id = $1
                  AND actual_quantity IS NOT NULL
                  AND actual_quantity <> book_quantity
                ORDER BY item_id
                "#,
            )
            .bind(audit_id)
            .fetch_all(&mut *tx)
            .await?;

            let pairs: Vec<(Uuid, Uuid)> = counted
                .iter()
                .map(|(item_id, _)| (*item_id, audit.warehouse_id))
                .collect();
            let live = stock::lock_quantities(&mut *tx, &pairs).await?;

            let notes = format!("Audit adjustment: {}", audit.name);
            let plan = plan_adjustments(audit.warehouse_id, &counted, &live);
            for (entry, (_, actual)) in plan.iter().zip(counted.iter()) {
                insert_transaction(
                    &mut *tx,
                    entry,
                    audit.audit_date,
                    Some(&notes),
                    Some(actor_id),
                )
                .await?;
                stock::set_absolute(&mut *tx, entry.item_id, entry.warehouse_id, *actual).await?;
                applied += 1;
            }
        }

        sqlx::query(
            "UPDATE stock_audits SET status = 'completed', completed_at = NOW() WHERE id = $1",
        )
        .bind(audit_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            audit_id = %audit_id,
            apply_differences,
            applied,
            "Completed stock audit"
        );

        Ok(applied)
    }

    /// Hard-delete an in-progress audit and its items
    ///
    /// A completed audit is immutable history and cannot be deleted.
    pub async fn delete_audit(&self, audit_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM stock_audits WHERE id = $1 FOR UPDATE",
        )
        .bind(audit_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Audit".to_string()))?;

        let status = AuditStatus::parse(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown audit status: {}", status)))?;
        ensure_in_progress(status, "deleted")?;

        sqlx::query("DELETE FROM stock_audit_items WHERE audit_id = $1")
            .bind(audit_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM stock_audits WHERE id = $1")
            .bind(audit_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
