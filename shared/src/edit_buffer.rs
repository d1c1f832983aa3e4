//! Client-held staging buffer for audit count entry
//!
//! Operators key counts into a spreadsheet-style grid; every cell edit is
//! staged here and the whole buffer is committed to the backend in a
//! single batch call. Nothing in this module is persisted: the buffer
//! exists only until committed or discarded.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field updates staged for one audit item
///
/// A later stage of the same field overwrites the earlier value; fields
/// left `None` are not touched by the commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_quantity: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Item version the edits were based on. When present the backend
    /// rejects the commit if the row has moved on since.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_version: Option<i32>,
}

impl PendingChange {
    pub fn is_empty(&self) -> bool {
        self.actual_quantity.is_none() && self.notes.is_none()
    }
}

/// Payload of one batch update call to the audit manager
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub updates: HashMap<Uuid, PendingChange>,
}

/// In-memory staging area mapping audit item -> proposed field changes
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    staged: HashMap<Uuid, PendingChange>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a counted quantity, overwriting any prior staged count
    pub fn stage_actual_quantity(&mut self, audit_item_id: Uuid, quantity: Decimal) {
        self.staged.entry(audit_item_id).or_default().actual_quantity = Some(quantity);
    }

    /// Stage a notes edit, overwriting any prior staged notes
    pub fn stage_notes(&mut self, audit_item_id: Uuid, notes: String) {
        self.staged.entry(audit_item_id).or_default().notes = Some(notes);
    }

    /// Record the item version the operator was looking at when editing
    pub fn stage_base_version(&mut self, audit_item_id: Uuid, version: i32) {
        self.staged.entry(audit_item_id).or_default().base_version = Some(version);
    }

    /// Number of items with at least one staged change
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Staged changes for one item, if any
    pub fn staged_for(&self, audit_item_id: Uuid) -> Option<&PendingChange> {
        self.staged.get(&audit_item_id)
    }

    /// Drain the buffer into a single batch update payload
    pub fn commit(&mut self) -> BatchUpdateRequest {
        BatchUpdateRequest {
            updates: std::mem::take(&mut self.staged),
        }
    }

    /// Throw away all staged changes without committing
    pub fn discard(&mut self) {
        self.staged.clear();
    }
}
