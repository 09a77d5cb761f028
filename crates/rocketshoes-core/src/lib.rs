//! # rocketshoes-core: Pure Cart Rules for the RocketShoes Storefront
//!
//! Everything the cart *decides* lives here; everything the cart *does*
//! (fetching stock, writing local storage, notifying the UI) lives in
//! `rocketshoes-cart`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     RocketShoes Cart Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Storefront UI / CLI                            │   │
//! │  │   Product list ──► Cart page ──► Header badge                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    CartStore (rocketshoes-cart)                 │   │
//! │  │   add_product, remove_product, update_product_amount           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ rocketshoes-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │ LineItem  │  │   Money   │  │ CoreError │  │  stock    │  │   │
//! │  │   │   Cart    │  │  totals   │  │           │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `LineItem`, `Cart`, `ProductDetails`, `StockRecord`
//! - [`money`] - Integer-cent money for cart totals
//! - [`error`] - Domain error types
//! - [`validation`] - Stock and payload checks
//!
//! ## Example Usage
//!
//! ```rust
//! use rocketshoes_core::{Cart, LineItem, ProductDetails};
//!
//! let sneaker = ProductDetails {
//!     id: 1,
//!     title: "Tênis de Caminhada Leve Confortável".to_string(),
//!     price: 179.9,
//!     image: "https://example.com/sneaker.jpg".to_string(),
//! };
//!
//! let cart = Cart::new()
//!     .with_added(LineItem::from_product(&sneaker, 1).unwrap())
//!     .unwrap();
//!
//! assert_eq!(cart.amount_of(1), 1);
//! assert_eq!(cart.total().cents(), 17990);
//! ```

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Storage key the cart is persisted under.
///
/// Namespaced like every other key the storefront writes so that a shared
/// local store never collides with another app.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";
