//! # Domain Types
//!
//! Core domain types for the cart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cart Types                                     │
//! │                                                                         │
//! │  Remote (read-only)                 Local (owned by CartStore)          │
//! │  ──────────────────                 ──────────────────────────          │
//! │                                                                         │
//! │  ProductDetails ──── from_product ──► LineItem ──┐                     │
//! │  { id, title,                         { id, title, price,              │
//! │    price, image }                       image, amount }                │
//! │                                                  │                      │
//! │  StockRecord ─── checked before ───►  Cart = [LineItem, ...]          │
//! │  { productId, amount }   every write    unique by id, amount >= 1      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutable Transforms
//! `Cart` never changes in place. Every mutation builds a new cart
//! (`with_added`, `with_amount`, `without`) that is validated, persisted,
//! and only then swapped in by the store. A reader never observes a
//! half-applied change.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_product_details;

/// Product identifier as issued by the stock service.
pub type ProductId = u32;

// =============================================================================
// Remote Payloads
// =============================================================================

/// Display data for a product, as returned by `GET /products/{id}`.
///
/// The service may send more fields (brand, sizes, ...); they are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub image: String,
}

/// Remaining inventory for a product, as returned by `GET /stock/{id}`.
///
/// Never cached: every mutation fetches a fresh record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    /// Some services echo the product id, some don't. A json-server style
    /// `id` key is ignored along with any other extra field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,

    /// Units available. May be zero or, on a misbehaving service, negative.
    pub amount: i64,
}

impl StockRecord {
    /// Creates a stock record for a product.
    pub fn new(product_id: ProductId, amount: i64) -> Self {
        StockRecord {
            product_id: Some(product_id),
            amount,
        }
    }

    /// True if `requested` units fit within the available stock.
    #[inline]
    pub fn covers(&self, requested: i64) -> bool {
        requested <= self.amount
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product's entry in the cart.
///
/// ## Design Notes
/// - `title`, `price`, `image` are a frozen copy of the product lookup made
///   when the line was created. Later stock checks never refresh them.
/// - `price` keeps the service's JSON number so the persisted cart
///   reproduces it exactly; use [`LineItem::unit_price`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub image: String,
    pub amount: u32,
}

impl LineItem {
    /// Builds a line from a product lookup.
    ///
    /// Display data is copied verbatim. Rejects a non-finite price and an
    /// `amount` of 0.
    pub fn from_product(product: &ProductDetails, amount: u32) -> CoreResult<Self> {
        validate_product_details(product)?;
        if amount == 0 {
            return Err(ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: 1,
                max: u32::MAX as i64,
            }
            .into());
        }

        Ok(LineItem {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            amount,
        })
    }

    /// Returns a copy with a different quantity; display data untouched.
    pub fn with_amount(&self, amount: u32) -> Self {
        LineItem {
            amount,
            ..self.clone()
        }
    }

    /// Unit price in cents.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_price(self.price)
    }

    /// Unit price × amount.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.amount)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopper's pending selection.
///
/// ## Invariants
/// - At most one line per product id
/// - Every line has `amount >= 1`
/// - Lines keep insertion order
///
/// The fields are private so the invariants can only be broken by going
/// through serde, and deserialization re-checks them (see
/// [`Cart::from_items`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from raw lines, checking every invariant.
    ///
    /// ## Errors
    /// `CoreError::InvalidCart` on a duplicate id or an amount of 0.
    pub fn from_items(items: Vec<LineItem>) -> CoreResult<Self> {
        for (index, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(CoreError::InvalidCart {
                    reason: format!("product {} has amount 0", item.id),
                });
            }
            if items[..index].iter().any(|other| other.id == item.id) {
                return Err(CoreError::InvalidCart {
                    reason: format!("product {} appears more than once", item.id),
                });
            }
        }

        Ok(Cart { items })
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Looks up the line for a product.
    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == product_id)
    }

    /// True if the product has a line.
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Quantity of a product in the cart, or 0 if absent.
    pub fn amount_of(&self, product_id: ProductId) -> u32 {
        self.get(product_id).map_or(0, |item| item.amount)
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products (what the header badge shows).
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all line amounts.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line subtotals.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Returns a new cart with `item` appended.
    ///
    /// ## Errors
    /// - `ProductAlreadyInCart` if the id already has a line (use
    ///   [`Cart::with_amount`] to bump it instead)
    /// - `InvalidCart` if `item.amount` is 0
    pub fn with_added(&self, item: LineItem) -> CoreResult<Self> {
        if self.contains(item.id) {
            return Err(CoreError::ProductAlreadyInCart(item.id));
        }
        if item.amount == 0 {
            return Err(CoreError::InvalidCart {
                reason: format!("product {} has amount 0", item.id),
            });
        }

        let mut items = self.items.clone();
        items.push(item);
        Ok(Cart { items })
    }

    /// Returns a new cart where one line's amount is replaced.
    ///
    /// Other lines and the line's display data are untouched. An `amount`
    /// of 0 is rejected: removing a line is [`Cart::without`]'s job.
    pub fn with_amount(&self, product_id: ProductId, amount: u32) -> CoreResult<Self> {
        if !self.contains(product_id) {
            return Err(CoreError::ProductNotInCart(product_id));
        }
        if amount == 0 {
            return Err(CoreError::InvalidCart {
                reason: format!("product {} would have amount 0", product_id),
            });
        }

        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id == product_id {
                    item.with_amount(amount)
                } else {
                    item.clone()
                }
            })
            .collect();

        Ok(Cart { items })
    }

    /// Returns a new cart without the product's line.
    pub fn without(&self, product_id: ProductId) -> CoreResult<Self> {
        if !self.contains(product_id) {
            return Err(CoreError::ProductNotInCart(product_id));
        }

        let items = self
            .items
            .iter()
            .filter(|item| item.id != product_id)
            .cloned()
            .collect();

        Ok(Cart { items })
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CoreError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Cart::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, price: f64) -> ProductDetails {
        ProductDetails {
            id,
            title: format!("Sneaker {}", id),
            price,
            image: format!("https://cdn.example.com/{}.jpg", id),
        }
    }

    fn item(id: ProductId, amount: u32) -> LineItem {
        LineItem::from_product(&product(id, 139.9), amount).unwrap()
    }

    #[test]
    fn test_from_product_copies_display_data() {
        let details = product(7, 179.9);
        let line = LineItem::from_product(&details, 1).unwrap();

        assert_eq!(line.id, 7);
        assert_eq!(line.title, "Sneaker 7");
        assert_eq!(line.price, 179.9);
        assert_eq!(line.image, details.image);
        assert_eq!(line.amount, 1);
    }

    #[test]
    fn test_from_product_rejects_zero_amount() {
        assert!(LineItem::from_product(&product(1, 10.0), 0).is_err());
    }

    #[test]
    fn test_from_product_keeps_long_title() {
        let details = ProductDetails {
            title: "T".repeat(201),
            ..product(1, 10.0)
        };

        let line = LineItem::from_product(&details, 1).unwrap();
        assert_eq!(line.title.chars().count(), 201);

        assert!(LineItem::from_product(&product(1, f64::NAN), 1).is_err());
    }

    #[test]
    fn test_with_added_rejects_duplicates() {
        let cart = Cart::new().with_added(item(1, 1)).unwrap();

        let err = cart.with_added(item(1, 1)).unwrap_err();
        assert_eq!(err, CoreError::ProductAlreadyInCart(1));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_with_amount_leaves_other_lines_alone() {
        let cart = Cart::from_items(vec![item(1, 1), item(2, 1)]).unwrap();

        let updated = cart.with_amount(2, 5).unwrap();

        assert_eq!(updated.amount_of(2), 5);
        assert_eq!(updated.get(1), cart.get(1));
        assert_eq!(updated.get(2).unwrap().title, "Sneaker 2");
        // Original is untouched
        assert_eq!(cart.amount_of(2), 1);
    }

    #[test]
    fn test_with_amount_missing_product() {
        let cart = Cart::new();
        assert_eq!(
            cart.with_amount(9, 2).unwrap_err(),
            CoreError::ProductNotInCart(9)
        );
    }

    #[test]
    fn test_with_amount_rejects_zero() {
        let cart = Cart::from_items(vec![item(1, 3)]).unwrap();
        assert!(cart.with_amount(1, 0).is_err());
    }

    #[test]
    fn test_without() {
        let cart = Cart::from_items(vec![item(5, 1), item(6, 2)]).unwrap();

        let removed = cart.without(5).unwrap();
        assert_eq!(removed.items(), &[item(6, 2)]);

        assert_eq!(
            removed.without(5).unwrap_err(),
            CoreError::ProductNotInCart(5)
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let cart = Cart::new()
            .with_added(item(3, 1))
            .unwrap()
            .with_added(item(1, 1))
            .unwrap()
            .with_added(item(2, 1))
            .unwrap();

        let ids: Vec<ProductId> = cart.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_totals() {
        let cart = Cart::from_items(vec![
            LineItem::from_product(&product(1, 139.9), 2).unwrap(),
            LineItem::from_product(&product(2, 0.1), 3).unwrap(),
        ])
        .unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total().cents(), 27980 + 30);
    }

    #[test]
    fn test_json_shape() {
        let cart = Cart::from_items(vec![item(1, 2)]).unwrap();
        let json = serde_json::to_value(&cart).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{
                "id": 1,
                "title": "Sneaker 1",
                "price": 139.9,
                "image": "https://cdn.example.com/1.jpg",
                "amount": 2
            }])
        );
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let cart = Cart::from_items(vec![item(1, 2), item(4, 1)]).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let reloaded: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_deserialize_rejects_broken_invariants() {
        let duplicate = r#"[
            {"id":1,"title":"a","price":1.0,"image":"x","amount":1},
            {"id":1,"title":"a","price":1.0,"image":"x","amount":2}
        ]"#;
        assert!(serde_json::from_str::<Cart>(duplicate).is_err());

        let zero = r#"[{"id":1,"title":"a","price":1.0,"image":"x","amount":0}]"#;
        assert!(serde_json::from_str::<Cart>(zero).is_err());

        let negative = r#"[{"id":1,"title":"a","price":1.0,"image":"x","amount":-1}]"#;
        assert!(serde_json::from_str::<Cart>(negative).is_err());
    }

    #[test]
    fn test_stock_record_id_fields() {
        let with_product_id: StockRecord =
            serde_json::from_str(r#"{"productId":3,"amount":5}"#).unwrap();
        assert_eq!(with_product_id, StockRecord::new(3, 5));

        let with_row_id: StockRecord = serde_json::from_str(r#"{"id":3,"amount":5}"#).unwrap();
        assert_eq!(with_row_id.product_id, None);
        assert_eq!(with_row_id.amount, 5);

        let with_both: StockRecord =
            serde_json::from_str(r#"{"id":1,"productId":1,"amount":3}"#).unwrap();
        assert_eq!(with_both, StockRecord::new(1, 3));

        let bare: StockRecord = serde_json::from_str(r#"{"amount":0}"#).unwrap();
        assert_eq!(bare.product_id, None);
        assert!(!bare.covers(1));
    }

    #[test]
    fn test_product_details_ignores_extra_fields() {
        let json = r#"{"id":2,"title":"Tênis","price":139.9,"image":"i.jpg","brand":"X"}"#;
        let details: ProductDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.id, 2);
    }
}
