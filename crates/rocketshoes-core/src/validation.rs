//! # Validation Module
//!
//! Stock checks and payload validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where Each Check Runs                                │
//! │                                                                         │
//! │  add_product(id)                                                        │
//! │    GET /stock/id ──► ensure_in_stock(id, current + 1, stock)           │
//! │    GET /products/id ──► ensure_matching_product(id, details)           │
//! │                         validate_product_details(details)              │
//! │                                                                         │
//! │  update_product_amount(id, amount)                                      │
//! │    GET /stock/id ──► ensure_in_stock(id, amount, stock)                │
//! │                                                                         │
//! │  remove_product(id)                                                     │
//! │    (no remote calls, no stock check)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rocketshoes_core::validation::ensure_in_stock;
//! use rocketshoes_core::StockRecord;
//!
//! let stock = StockRecord::new(1, 3);
//! assert_eq!(ensure_in_stock(1, 3, &stock).unwrap(), 3);
//! assert!(ensure_in_stock(1, 4, &stock).is_err());
//! assert!(ensure_in_stock(1, 0, &stock).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{ProductDetails, ProductId, StockRecord};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Stock
// =============================================================================

/// Checks that `requested` units of a product can be held in the cart.
///
/// ## Rules
/// - `requested` must be at least 1
/// - `requested` must not exceed `stock.amount`
///
/// Both failures are `StockUnavailable`: from the shopper's point of view
/// "0 pairs" and "more pairs than we have" are the same dead end.
///
/// ## Returns
/// The requested amount as a line quantity.
pub fn ensure_in_stock(
    product_id: ProductId,
    requested: i64,
    stock: &StockRecord,
) -> CoreResult<u32> {
    if requested < 1 || !stock.covers(requested) {
        return Err(CoreError::StockUnavailable {
            product_id,
            requested,
            available: stock.amount,
        });
    }

    u32::try_from(requested).map_err(|_| {
        ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: u32::MAX as i64,
        }
        .into()
    })
}

// =============================================================================
// Payloads
// =============================================================================

/// Validates a product lookup before it becomes a line item.
///
/// Title and image are copied as the service sent them. The price feeds
/// the cart totals and must be finite.
pub fn validate_product_details(product: &ProductDetails) -> ValidationResult<()> {
    if !product.price.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("{} is not a valid price", product.price),
        });
    }

    Ok(())
}

/// Checks that the service answered for the product that was asked about.
///
/// A mismatched id would let one product's data land on another
/// product's line and break the one-line-per-id rule.
pub fn ensure_matching_product(
    requested: ProductId,
    product: &ProductDetails,
) -> ValidationResult<()> {
    if product.id != requested {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: format!("asked for product {}, got {}", requested, product.id),
        });
    }

    Ok(())
}
