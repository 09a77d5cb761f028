//! # rocketshoes-db: Local Persistent Store
//!
//! A browser-`localStorage` equivalent on top of SQLite. Values are opaque
//! strings under namespaced keys; the cart crate stores its JSON here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Persistence Flow                            │
//! │                                                                         │
//! │  CartStore::load ──────────── once at startup ──────┐                  │
//! │  CartStore mutation ───────── after every commit ───┤                  │
//! │                                                      ▼                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  rocketshoes-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │ LocalStorage       │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ Repository         │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ get/set/remove     │  │ 001_...sql │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   local_storage(key, value, updated_at)                        │   │
//! │  │   "@RocketShoes:cart" → '[{"id":1,...,"amount":2}]'            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rocketshoes_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("rocketshoes.db")).await?;
//! db.local_storage().set_item("@RocketShoes:cart", "[]").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::local_storage::LocalStorageRepository;
