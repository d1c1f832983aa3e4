//! Batch transaction processor
//!
//! Turns a submitted cart into an atomic multi-item ledger mutation.
//! Validation is fail-fast and the whole batch applies in one storage
//! transaction: a single bad item rejects the entire cart before any
//! `warehouse_stocks` row moves. Transfers produce a matched out/in pair
//! of entries sharing a `linked_transfer_id`, created together or not at
//! all.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{catalog::CatalogService, stock};
use shared::{
    validate_parallel_lengths, validate_quantity, BatchRequestType, StockTransaction,
    TransactionType,
};

/// Transaction processor: the only writer of ledger rows
#[derive(Clone)]
pub struct TransactionService {
    db: PgPool,
}

/// Cart submission payload
///
/// Warehouses resolve in one of three modes: a single `warehouse_id` for
/// the whole cart, parallel `warehouse_ids` per item, or source plus
/// destination (single or parallel) for transfers.
#[derive(Debug, Deserialize)]
pub struct BatchTransactionInput {
    pub stock_item_ids: Vec<Uuid>,
    pub quantities: Vec<Decimal>,
    pub request_type: BatchRequestType,
    pub warehouse_id: Option<Uuid>,
    pub warehouse_ids: Option<Vec<Uuid>>,
    pub source_warehouse_id: Option<Uuid>,
    pub destination_warehouse_id: Option<Uuid>,
    pub source_warehouse_ids: Option<Vec<Uuid>>,
    pub destination_warehouse_ids: Option<Vec<Uuid>>,
    pub notes: Option<String>,
    pub transaction_date: Option<NaiveDate>,
}

/// One resolved cart line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: Uuid,
    /// Warehouse stock is drawn from (outgoing, transfer source)
    pub source: Option<Uuid>,
    /// Warehouse stock arrives at (incoming, transfer destination)
    pub destination: Option<Uuid>,
}

/// Quantity paired with a cart line after resolution
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub line: CartLine,
    pub quantity: Decimal,
}

/// One planned ledger entry, not yet persisted
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub item_id: Uuid,
    pub warehouse_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_delta: Decimal,
    pub linked_transfer_id: Option<Uuid>,
}

/// Resolve cart arrays into per-line warehouses, fail-fast
///
/// Order of checks mirrors the submission flow: empty cart, non-positive
/// quantity, array arity, missing warehouse selection, then same-warehouse
/// transfers (only knowable after per-item resolution).
pub fn resolve_cart(input: &BatchTransactionInput) -> AppResult<Vec<ResolvedLine>> {
    validate_parallel_lengths(input.stock_item_ids.len(), input.quantities.len()).map_err(
        |message| AppError::Validation {
            field: "stock_item_ids".to_string(),
            message: message.to_string(),
        },
    )?;

    for quantity in &input.quantities {
        validate_quantity(*quantity).map_err(|message| AppError::Validation {
            field: "quantities".to_string(),
            message: message.to_string(),
        })?;
    }

    let count = input.stock_item_ids.len();
    let mut lines = Vec::with_capacity(count);

    for (idx, (&item_id, &quantity)) in input
        .stock_item_ids
        .iter()
        .zip(input.quantities.iter())
        .enumerate()
    {
        let line = match input.request_type {
            BatchRequestType::Incoming => CartLine {
                item_id,
                source: None,
                destination: Some(resolve_warehouse(
                    input.warehouse_id,
                    input.warehouse_ids.as_deref(),
                    idx,
                    count,
                    "warehouse_id",
                )?),
            },
            BatchRequestType::Outgoing => CartLine {
                item_id,
                source: Some(resolve_warehouse(
                    input.warehouse_id,
                    input.warehouse_ids.as_deref(),
                    idx,
                    count,
                    "warehouse_id",
                )?),
                destination: None,
            },
            BatchRequestType::Transfer => {
                let source = resolve_warehouse(
                    input.source_warehouse_id,
                    input.source_warehouse_ids.as_deref(),
                    idx,
                    count,
                    "source_warehouse_id",
                )?;
                let destination = resolve_warehouse(
                    input.destination_warehouse_id,
                    input.destination_warehouse_ids.as_deref(),
                    idx,
                    count,
                    "destination_warehouse_id",
                )?;
                if source == destination {
                    return Err(AppError::Validation {
                        field: "destination_warehouse_id".to_string(),
                        message: format!(
                            "Transfer source and destination are the same warehouse for item {}",
                            item_id
                        ),
                    });
                }
                CartLine {
                    item_id,
                    source: Some(source),
                    destination: Some(destination),
                }
            }
        };

        lines.push(ResolvedLine { line, quantity });
    }

    Ok(lines)
}

/// Pick the warehouse for one cart position from single or parallel form
fn resolve_warehouse(
    single: Option<Uuid>,
    parallel: Option<&[Uuid]>,
    idx: usize,
    count: usize,
    field: &str,
) -> AppResult<Uuid> {
    if let Some(ids) = parallel {
        if ids.len() != count {
            return Err(AppError::Validation {
                field: format!("{}s", field),
                message: "Warehouse list must have one entry per cart item".to_string(),
            });
        }
        return Ok(ids[idx]);
    }
    single.ok_or_else(|| AppError::Validation {
        field: field.to_string(),
        message: "Warehouse selection is required".to_string(),
    })
}

/// All (item, warehouse) pairs a resolved cart touches
pub fn affected_pairs(lines: &[ResolvedLine]) -> Vec<(Uuid, Uuid)> {
    let mut pairs = Vec::new();
    for resolved in lines {
        if let Some(source) = resolved.line.source {
            pairs.push((resolved.line.item_id, source));
        }
        if let Some(destination) = resolved.line.destination {
            pairs.push((resolved.line.item_id, destination));
        }
    }
    pairs.sort();
    pairs.dedup();
    pairs
}

/// Build the ledger mutation plan for a resolved cart
///
/// `current` must hold the locked quantity of every affected pair.
/// Sufficiency is checked against the aggregate outflow per pair so a cart
/// naming the same item twice cannot sneak past a per-line check. Any
/// violation rejects the whole batch; no partial plan is ever returned.
pub fn build_plan(
    request_type: BatchRequestType,
    lines: &[ResolvedLine],
    current: &HashMap<(Uuid, Uuid), Decimal>,
) -> AppResult<Vec<PlannedEntry>> {
    let mut entries = Vec::new();
    let mut outflow: HashMap<(Uuid, Uuid), Decimal> = HashMap::new();

    for resolved in lines {
        let item_id = resolved.line.item_id;
        let quantity = resolved.quantity;

        match request_type {
            BatchRequestType::Incoming => {
                let warehouse_id = destination_of(resolved)?;
                entries.push(PlannedEntry {
                    item_id,
                    warehouse_id,
                    transaction_type: TransactionType::Incoming,
                    quantity_delta: quantity,
                    linked_transfer_id: None,
                });
            }
            BatchRequestType::Outgoing => {
                let warehouse_id = source_of(resolved)?;
                *outflow.entry((item_id, warehouse_id)).or_default() += quantity;
                entries.push(PlannedEntry {
                    item_id,
                    warehouse_id,
                    transaction_type: TransactionType::Outgoing,
                    quantity_delta: -quantity,
                    linked_transfer_id: None,
                });
            }
            BatchRequestType::Transfer => {
                let source = source_of(resolved)?;
                let destination = destination_of(resolved)?;
                let link = Uuid::new_v4();
                *outflow.entry((item_id, source)).or_default() += quantity;
                entries.push(PlannedEntry {
                    item_id,
                    warehouse_id: source,
                    transaction_type: TransactionType::TransferOut,
                    quantity_delta: -quantity,
                    linked_transfer_id: Some(link),
                });
                entries.push(PlannedEntry {
                    item_id,
                    warehouse_id: destination,
                    transaction_type: TransactionType::TransferIn,
                    quantity_delta: quantity,
                    linked_transfer_id: Some(link),
                });
            }
        }
    }

    for ((item_id, warehouse_id), requested) in &outflow {
        let available = current
            .get(&(*item_id, *warehouse_id))
            .copied()
            .unwrap_or(Decimal::ZERO);
        if *requested > available {
            return Err(AppError::InsufficientStock {
                item_id: *item_id,
                warehouse_id: *warehouse_id,
                requested: *requested,
                available,
            });
        }
    }

    Ok(entries)
}

fn source_of(resolved: &ResolvedLine) -> AppResult<Uuid> {
    resolved.line.source.ok_or_else(|| {
        AppError::Internal(format!(
            "Cart line for item {} resolved without a source warehouse",
            resolved.line.item_id
        ))
    })
}

fn destination_of(resolved: &ResolvedLine) -> AppResult<Uuid> {
    resolved.line.destination.ok_or_else(|| {
        AppError::Internal(format!(
            "Cart line for item {} resolved without a destination warehouse",
            resolved.line.item_id
        ))
    })
}

/// Row for transaction queries
#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    item_id: Uuid,
    warehouse_id: Uuid,
    transaction_type: String,
    quantity_delta: Decimal,
    occurred_at: NaiveDate,
    notes: Option<String>,
    linked_transfer_id: Option<Uuid>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self) -> AppResult<StockTransaction> {
        let transaction_type = parse_transaction_type(&self.transaction_type)?;
        Ok(StockTransaction {
            id: self.id,
            item_id: self.item_id,
            warehouse_id: self.warehouse_id,
            transaction_type,
            quantity_delta: self.quantity_delta,
            occurred_at: self.occurred_at,
            notes: self.notes,
            linked_transfer_id: self.linked_transfer_id,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

fn parse_transaction_type(s: &str) -> AppResult<TransactionType> {
    match s {
        "incoming" => Ok(TransactionType::Incoming),
        "outgoing" => Ok(TransactionType::Outgoing),
        "transfer_out" => Ok(TransactionType::TransferOut),
        "transfer_in" => Ok(TransactionType::TransferIn),
        "adjustment" => Ok(TransactionType::Adjustment),
        other => Err(AppError::Internal(format!(
            "Unknown transaction type: {}",
            other
        ))),
    }
}

/// Filters for the transaction history listing
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub item_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
}

impl TransactionService {
    /// Create a new TransactionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate and atomically apply one cart
    ///
    /// Lock, sufficiency check and apply happen under a single storage
    /// transaction; on any error the transaction rolls back and the ledger
    /// is untouched.
    pub async fn process_batch(
        &self,
        actor_id: Uuid,
        input: BatchTransactionInput,
    ) -> AppResult<Vec<StockTransaction>> {
        let lines = resolve_cart(&input)?;

        // Resolve references before touching the ledger
        let catalog = CatalogService::new(self.db.clone());
        catalog.resolve_items(&input.stock_item_ids).await?;
        let warehouses: Vec<Uuid> = affected_pairs(&lines)
            .iter()
            .map(|(_, warehouse_id)| *warehouse_id)
            .collect();
        catalog.validate_warehouses(&warehouses).await?;

        let occurred_at = input
            .transaction_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        let locked = stock::lock_quantities(&mut *tx, &affected_pairs(&lines)).await?;
        let plan = build_plan(input.request_type, &lines, &locked)?;

        let mut created = Vec::with_capacity(plan.len());
        for entry in &plan {
            stock::apply_delta(
                &mut *tx,
                entry.item_id,
                entry.warehouse_id,
                entry.quantity_delta,
            )
            .await?;
            let record = insert_transaction(
                &mut *tx,
                entry,
                occurred_at,
                input.notes.as_deref(),
                Some(actor_id),
            )
            .await?;
            created.push(record);
        }

        tx.commit().await?;

        tracing::info!(
            batch = input.request_type.as_str(),
            entries = created.len(),
            "Applied transaction batch"
        );

        Ok(created)
    }

    /// Transaction history, newest first
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> AppResult<Vec<StockTransaction>> {
        let limit = filter.limit.unwrap_or(100).clamp(1, 1000);
        let type_str = filter.transaction_type.map(|t| t.as_str().to_string());

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, item_id, warehouse_id, transaction_type, quantity_delta,
                   occurred_at, notes, linked_transfer_id, created_by, created_at
            FROM stock_transactions
            WHERE ($1::uuid IS NULL OR item_id = $1)
              AND ($2::uuid IS NULL OR warehouse_id = $2)
              AND ($3::text IS NULL OR transaction_type = $3)
              AND ($4::date IS NULL OR occurred_at >= $4)
              AND ($5::date IS NULL OR occurred_at <= $5)
            ORDER BY occurred_at DESC, created_at DESC
            LIMIT $6
            "#,
        )
        .bind(filter.item_id)
        .bind(filter.warehouse_id)
        .bind(type_str)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }
}

/// Append one immutable ledger entry on a caller-owned transaction
///
/// Shared with the audit manager, which records adjustment entries during
/// completion.
pub(crate) async fn insert_transaction(
    conn: &mut PgConnection,
    entry: &PlannedEntry,
    occurred_at: NaiveDate,
    notes: Option<&str>,
    created_by: Option<Uuid>,
) -> AppResult<StockTransaction> {
    let row = sqlx::query_as::<_, TransactionRow>(
        r#"
        INSERT INTO stock_transactions (
            item_id, warehouse_id, transaction_type, quantity_delta,
            occurred_at, notes, linked_transfer_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, item_id, warehouse_id, transaction_type, quantity_delta,
                  occurred_at, notes, linked_transfer_id, created_by, created_at
        "#,
    )
    .bind(entry.item_id)
    .bind(entry.warehouse_id)
    .bind(entry.transaction_type.as_str())
    .bind(entry.quantity_delta)
    .bind(occurred_at)
    .bind(notes)
    .bind(entry.linked_transfer_id)
    .bind(created_by)
    .fetch_one(&mut *conn)
    .await?;

    row.into_transaction()
}
