//! # Notifications
//!
//! What the shopper sees when a mutation does not go through.
//!
//! ## Categories
//! ```text
//! ┌──────────────────┬─────────────────────────────────────────┐
//! │ Kind             │ Message                                 │
//! ├──────────────────┼─────────────────────────────────────────┤
//! │ StockUnavailable │ Requested quantity is out of stock      │
//! │ AddError         │ Error adding product                    │
//! │ RemoveError      │ Error removing product                  │
//! │ UpdateError      │ Error changing product quantity         │
//! └──────────────────┴─────────────────────────────────────────┘
//! ```
//!
//! Every failed mutation emits exactly one [`Notification`]. Successful
//! mutations emit none; observers learn about them from the cart watch.

use rocketshoes_core::ProductId;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// The three cart mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    /// Generic category used when the failure is not a stock problem.
    pub fn failure_kind(self) -> NotificationKind {
        match self {
            Operation::Add => NotificationKind::AddError,
            Operation::Remove => NotificationKind::RemoveError,
            Operation::Update => NotificationKind::UpdateError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add_product",
            Operation::Remove => "remove_product",
            Operation::Update => "update_product_amount",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationKind {
    StockUnavailable,
    AddError,
    RemoveError,
    UpdateError,
}

impl NotificationKind {
    /// Text shown to the shopper.
    pub fn message(self) -> &'static str {
        match self {
            NotificationKind::StockUnavailable => "Requested quantity is out of stock",
            NotificationKind::AddError => "Error adding product",
            NotificationKind::RemoveError => "Error removing product",
            NotificationKind::UpdateError => "Error changing product quantity",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A user-facing message about a failed mutation.
///
/// ## Serialization
/// ```json
/// {
///   "kind": "stock_unavailable",
///   "productId": 1,
///   "message": "Requested quantity is out of stock"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    pub kind: NotificationKind,
    pub product_id: ProductId,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, product_id: ProductId) -> Self {
        Notification {
            kind,
            product_id,
            message: kind.message().to_string(),
        }
    }
}

/// What a mutation did.
///
/// Mutations never return `Err`; callers that don't listen for
/// notifications branch on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "status", content = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum MutationOutcome {
    /// The new cart was persisted and published.
    Applied,
    /// Nothing changed; one notification of this kind was emitted.
    Rejected(NotificationKind),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }

    pub fn rejection(&self) -> Option<NotificationKind> {
        match self {
            MutationOutcome::Applied => None,
            MutationOutcome::Rejected(kind) => Some(*kind),
        }
    }
}
