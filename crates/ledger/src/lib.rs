//! `stockward-ledger` — append-only stock ledger and materialized projection.
//!
//! This crate is the source of truth for "how much is in stock". Every
//! quantity change is one immutable [`Movement`](movement::Movement); the
//! per-product [`StockProjection`](projection::StockProjection) is a derived,
//! rebuildable view advanced atomically with each committed movement. No
//! other component mutates quantity directly.

pub mod adjustment;
pub mod in_memory;
pub mod ledger;
pub mod movement;
pub mod projection;
pub mod store;

pub use adjustment::{AdjustmentGateway, AdjustmentType};
pub use in_memory::InMemoryMovementStore;
pub use ledger::{AppendMovement, StockLedger, StockWrite};
pub use movement::{Movement, MovementReference, MovementType};
pub use projection::StockProjection;
pub use store::{ExpectedVersion, MovementCursor, MovementFilter, MovementPage, MovementStore};
