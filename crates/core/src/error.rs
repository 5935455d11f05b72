//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain crates.
pub type StockResult<T> = Result<T, StockError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// quantity integrity, lifecycle rules). Transport concerns belong in the
/// API layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Malformed input (blank notes, negative quantity, bad enum value).
    /// Rejected before the ledger is touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation would drive a product's stock below zero.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// An order status change that the state graph does not allow.
    #[error("invalid order transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Optimistic-concurrency retries exhausted (or a stale write detected).
    /// Surfaced to the caller for client-side retry.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// Unknown product or order id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Ledger integrity failure (projection disagrees with the replayed
    /// chain). Fatal, never silently corrected.
    #[error("ledger integrity violation: {0}")]
    Integrity(String),
}

impl StockError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn concurrency(msg: impl Into<String>) -> Self {
        Self::Concurrency(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }
}
