//! Warehouse stock ledger models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current book quantity for one (item, warehouse) pair
///
/// One row per pair that has ever had a transaction. Rows are never
/// deleted; a drained pair stays as a zero row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub item_id: Uuid,
    pub warehouse_id: Uuid,
    pub current_quantity: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Ledger entry kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Incoming,
    Outgoing,
    TransferOut,
    TransferIn,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Incoming => "incoming",
            TransactionType::Outgoing => "outgoing",
            TransactionType::TransferOut => "transfer_out",
            TransactionType::TransferIn => "transfer_in",
            TransactionType::Adjustment => "adjustment",
        }
    }

    /// Whether this entry subtracts stock and must pass the sufficiency check
    pub fn draws_down(&self) -> bool {
        matches!(self, TransactionType::Outgoing | TransactionType::TransferOut)
    }
}

/// Kind of batch a cart submission requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchRequestType {
    Incoming,
    Outgoing,
    Transfer,
}

impl BatchRequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchRequestType::Incoming => "incoming",
            BatchRequestType::Outgoing => "outgoing",
            BatchRequestType::Transfer => "transfer",
        }
    }
}

/// An immutable ledger entry for one (item, warehouse) pair
///
/// Transfers are a matched pair of entries (`TransferOut` at the source,
/// `TransferIn` at the destination) sharing a `linked_transfer_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub warehouse_id: Uuid,
    pub transaction_type: TransactionType,
    /// Signed delta applied to the pair's book quantity
    pub quantity_delta: Decimal,
    pub occurred_at: NaiveDate,
    pub notes: Option<String>,
    pub linked_transfer_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_down_types() {
        assert!(TransactionType::Outgoing.draws_down());
        assert!(TransactionType::TransferOut.draws_down());
        assert!(!TransactionType::Incoming.draws_down());
        assert!(!TransactionType::TransferIn.draws_down());
        assert!(!TransactionType::Adjustment.draws_down());
    }

    #[test]
    fn test_transaction_type_strings_snake_case() {
        let all = [
            TransactionType::Incoming,
            TransactionType::Outgoing,
            TransactionType::TransferOut,
            TransactionType::TransferIn,
            TransactionType::Adjustment,
        ];
        for t in all {
            assert!(t
                .as_str()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
