//! `stockward-alerts` — derived low-stock view.
//!
//! The alert engine is a pure consumer: it compares the ledger's projection
//! against each product's minimum stock level and classifies the shortage.
//! It is recomputed on demand and never a source of truth.

pub mod engine;

pub use engine::{Alert, AlertEngine, Urgency};
