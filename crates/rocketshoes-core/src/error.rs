//! # Error Types
//!
//! Domain-specific error types for rocketshoes-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rocketshoes-core errors (this file)                                   │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Malformed input or payloads                    │
//! │                                                                         │
//! │  rocketshoes-db errors                                                 │
//! │  └── DbError          - Local storage failures                         │
//! │                                                                         │
//! │  rocketshoes-cart errors                                               │
//! │  ├── ApiError         - Stock service failures                         │
//! │  └── CartError        - Everything above, per operation                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError → Notification → UI     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::ProductId;

// =============================================================================
// Core Error
// =============================================================================

/// Cart rule violations.
///
/// None of these are faults: each one means "leave the cart as it is and
/// tell the shopper why".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The requested quantity cannot be satisfied by remote stock.
    ///
    /// ## When This Occurs
    /// - Adding one more of a product whose stock is already in the cart
    /// - Updating a quantity above the stock level
    /// - Updating a quantity below 1 (the update path never removes)
    ///
    /// ## User Workflow
    /// ```text
    /// Click "+" on cart row (amount: 2)
    ///      │
    ///      ▼
    /// GET /stock/1 → { amount: 2 }
    ///      │
    ///      ▼
    /// StockUnavailable { product_id: 1, requested: 3, available: 2 }
    ///      │
    ///      ▼
    /// Toast: "Requested quantity is out of stock"
    /// ```
    #[error("Requested quantity {requested} of product {product_id} unavailable (stock: {available})")]
    StockUnavailable {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(ProductId),

    /// A new line was requested for a product that already has one.
    #[error("Product {0} is already in the cart")]
    ProductAlreadyInCart(ProductId),

    /// A list of line items breaks a cart invariant.
    ///
    /// ## When This Occurs
    /// - Persisted JSON holds two lines for one product
    /// - Persisted JSON holds a line with amount 0
    #[error("Invalid cart: {reason}")]
    InvalidCart { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the one error the shopper can fix by picking another quantity.
    pub fn is_stock_unavailable(&self) -> bool {
        matches!(self, CoreError::StockUnavailable { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for caller-supplied values and for stock service payloads that
/// do not look like a product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., NaN price, mismatched id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
