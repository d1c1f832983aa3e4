//! Physical audit (stock count) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ItemType;

/// Lifecycle of an audit session
///
/// Transitions only forward: `InProgress -> Completed`. There is no
/// cancelled or reopened state; an in-progress audit may be hard-deleted
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    InProgress,
    Completed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::InProgress => "in_progress",
            AuditStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(AuditStatus::InProgress),
            "completed" => Some(AuditStatus::Completed),
            _ => None,
        }
    }
}

/// A reconciliation session against one warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAudit {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: AuditStatus,
    pub warehouse_id: Uuid,
    pub audit_date: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derived per-item count state
///
/// Never stored; always computed from the two quantities so it cannot
/// drift from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditItemStatus {
    Pending,
    Counted,
    Discrepancy,
}

impl AuditItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditItemStatus::Pending => "pending",
            AuditItemStatus::Counted => "counted",
            AuditItemStatus::Discrepancy => "discrepancy",
        }
    }
}

/// Compute the count state of an audit item from its quantities
pub fn derive_item_status(
    book_quantity: Decimal,
    actual_quantity: Option<Decimal>,
) -> AuditItemStatus {
    match actual_quantity {
        None => AuditItemStatus::Pending,
        Some(actual) if actual == book_quantity => AuditItemStatus::Counted,
        Some(_) => AuditItemStatus::Discrepancy,
    }
}

/// One catalog item inside an audit
///
/// `book_quantity` is snapshotted at audit creation and never changes,
/// even if the live ledger moves afterwards: the audit records what the
/// books said at count time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAuditItem {
    pub id: Uuid,
    pub audit_id: Uuid,
    pub item_id: Uuid,
    pub item_type: ItemType,
    pub book_quantity: Decimal,
    pub actual_quantity: Option<Decimal>,
    pub notes: Option<String>,
    /// Bumped on every committed update; used for stale-write rejection
    pub version: i32,
    pub status: AuditItemStatus,
}

/// Whole-audit progress counters, computed over all items regardless of
/// the page being viewed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AuditStats {
    pub total: i64,
    pub pending: i64,
    pub counted: i64,
    pub discrepancy: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_status_pending_while_uncounted() {
        assert_eq!(
            derive_item_status(dec("10.5"), None),
            AuditItemStatus::Pending
        );
    }

    #[test]
    fn test_status_counted_on_match() {
        assert_eq!(
            derive_item_status(dec("10.5"), Some(dec("10.5"))),
            AuditItemStatus::Counted
        );
    }

    #[test]
    fn test_status_discrepancy_on_mismatch() {
        assert_eq!(
            derive_item_status(dec("10.5"), Some(dec("9"))),
            AuditItemStatus::Discrepancy
        );
        assert_eq!(
            derive_item_status(dec("0"), Some(dec("0.001"))),
            AuditItemStatus::Discrepancy
        );
    }

    #[test]
    fn test_zero_count_of_zero_book_is_counted() {
        assert_eq!(
            derive_item_status(dec("0"), Some(dec("0"))),
            AuditItemStatus::Counted
        );
    }

    #[test]
    fn test_audit_status_round_trip() {
        for s in [AuditStatus::InProgress, AuditStatus::Completed] {
            assert_eq!(AuditStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AuditStatus::parse("cancelled"), None);
    }
}
