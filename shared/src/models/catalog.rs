//! Catalog models: stock items and warehouses
//!
//! The catalog is owned by the (out of scope) ingredient/menu CRUD screens.
//! The ledger core only reads these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of catalog item the ledger tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Ingredient,
    Container,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Ingredient => "ingredient",
            ItemType::Container => "container",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ingredient" => Some(ItemType::Ingredient),
            "container" => Some(ItemType::Container),
            _ => None,
        }
    }
}

/// A catalog item reference as the ledger sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    pub name: String,
    pub item_type: ItemType,
    /// Counting unit, e.g. "kg", "ea", "l"
    pub unit: String,
    /// Stock grade used by audit filters, e.g. "a", "b"
    pub stock_grade: String,
    pub created_at: DateTime<Utc>,
}

/// A storage location quantities are tracked against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_round_trip() {
        for t in [ItemType::Ingredient, ItemType::Container] {
            assert_eq!(ItemType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ItemType::parse("menu"), None);
    }
}
