//! # Cart Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CoreError ────────┐                                                    │
//! │  ApiError ─────────┤                                                    │
//! │  StorageError ─────┼──► CartError ──► kind_for(op) ──► Notification     │
//! │  serde_json::Error ┘                                                    │
//! │                                                                         │
//! │  Only StockUnavailable keeps its own category; every other failure     │
//! │  becomes the operation's generic "Error adding/removing/changing".      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `CartError` never leaves the crate through a mutation: `CartStore`
//! turns it into a [`Notification`](crate::Notification) and a
//! [`MutationOutcome`](crate::MutationOutcome).

use rocketshoes_core::{CoreError, ValidationError};
use rocketshoes_db::DbError;
use thiserror::Error;

use crate::notification::{NotificationKind, Operation};

// =============================================================================
// Remote Service
// =============================================================================

/// Failures talking to the stock/product service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL is unusable.
    #[error("Invalid stock service URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection refused, DNS failure, timeout, or the body was cut off.
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The body was not the JSON we expected.
    #[error("Unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ApiError {
    /// HTTP status code, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Local Storage
// =============================================================================

/// Failures reading or writing the persisted cart.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Local storage database error: {0}")]
    Database(#[from] DbError),

    /// Any other backend refusing the operation.
    #[error("Local storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Cart
// =============================================================================

/// Everything that can stop a mutation.
#[derive(Debug, Error)]
pub enum CartError {
    /// A cart rule said no (stock, missing line, bad payload).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Stock service error: {0}")]
    Remote(#[from] ApiError),

    /// The new cart could not be written; memory was left as it was.
    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Could not serialize cart: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationError> for CartError {
    fn from(err: ValidationError) -> Self {
        CartError::Core(CoreError::from(err))
    }
}

impl From<DbError> for CartError {
    fn from(err: DbError) -> Self {
        CartError::Storage(StorageError::from(err))
    }
}

impl CartError {
    /// Notification category for this failure during `operation`.
    pub fn kind_for(&self, operation: Operation) -> NotificationKind {
        match self {
            CartError::Core(err) if err.is_stock_unavailable() => NotificationKind::StockUnavailable,
            _ => operation.failure_kind(),
        }
    }

    /// True for rejections the shopper can fix (pick a smaller amount,
    /// refresh the cart). False for infrastructure faults and for bad
    /// payloads from the product service.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CartError::Core(CoreError::StockUnavailable { .. } | CoreError::ProductNotInCart(_))
        )
    }
}

pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine a config directory for this platform")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
