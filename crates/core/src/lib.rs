//! `stockward-core` — shared domain primitives.
//!
//! This crate contains **pure domain** building blocks (no infrastructure
//! concerns): typed identifiers and the error taxonomy shared by the ledger,
//! order fulfillment and alert crates.

pub mod error;
pub mod id;

pub use error::{StockError, StockResult};
pub use id::{MovementId, OrderId, ProductId, PurchaseId, UserId};
