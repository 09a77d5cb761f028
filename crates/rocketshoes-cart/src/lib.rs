//! # rocketshoes-cart: Cart State for the RocketShoes Storefront
//!
//! Owns the shopper's cart: loads it from local storage at startup, checks
//! every change against the remote stock service, writes it back after
//! every change, and tells the UI what happened.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         One Mutation                                    │
//! │                                                                         │
//! │  UI ──► add_product(1)                                                  │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         lock product 1 ──── other products proceed in parallel         │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         GET /stock/1 ──► enough? ── no ──► Notification(StockUnavail.) │
//! │              │ yes                                                      │
//! │              ▼                                                          │
//! │         GET /products/1 (new line only)                                │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         commit: new Cart from current ──► write local storage          │
//! │                                             │ ok         │ failed      │
//! │                                             ▼            ▼             │
//! │                                   publish on watch   Notification      │
//! │                                   (UI re-renders)    (cart untouched)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - `CartStore`, the only writer of the cart
//! - [`api`] - `StockService` trait and its reqwest implementation
//! - [`storage`] - `LocalStore` trait, SQLite and in-memory stores
//! - [`notification`] - user-facing messages and mutation outcomes
//! - [`config`] - TOML + environment configuration
//! - [`error`] - error types for every layer above

pub mod api;
pub mod config;
pub mod error;
mod lock;
pub mod notification;
pub mod storage;
pub mod store;

pub use api::{HttpStockService, StockService};
pub use config::CartConfig;
pub use error::{ApiError, CartError, ConfigError, StorageError};
pub use notification::{MutationOutcome, Notification, NotificationKind, Operation};
pub use storage::{LocalStore, MemoryStore};
pub use store::{AmountUpdate, CartStore, StoreOptions};

pub use rocketshoes_core::{Cart, LineItem, Money, ProductId};
