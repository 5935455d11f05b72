use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockward_core::ProductId;

/// Materialized current-quantity view for one product.
///
/// Exactly one row per product, created by the product's `initial` movement
/// and advanced atomically with every subsequent commit. Owned exclusively
/// by the movement store; every other component reads it, none writes it.
///
/// The projection is derived state: replaying all deltas from the `initial`
/// movement must reproduce `quantity` (see `StockLedger::verify`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockProjection {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Monotonically increasing per-product commit counter, used for the
    /// optimistic concurrency check.
    pub version: u64,
    pub last_updated: DateTime<Utc>,
}
