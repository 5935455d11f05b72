use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockward_core::{MovementId, ProductId, StockError, StockResult};

use crate::movement::{Movement, MovementReference, MovementType};
use crate::projection::StockProjection;

/// Optimistic concurrency expectation for a product's projection row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// No projection row may exist yet (first movement, `initial`).
    Absent,
    /// The projection must be at this exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::Absent, None) => true,
            (ExpectedVersion::Exact(v), Some(actual)) => v == actual,
            _ => false,
        }
    }

    pub fn check(self, actual: Option<u64>) -> StockResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(StockError::concurrency(format!(
                "projection version check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}

/// Opaque, restartable cursor into the most-recent-first movement listing.
///
/// Encodes the last-seen `(created_at, movement_id)` pair. UUIDv7 movement
/// ids break timestamp ties deterministically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCursor {
    pub created_at: DateTime<Utc>,
    pub id: MovementId,
}

impl MovementCursor {
    pub fn of(movement: &Movement) -> Self {
        Self {
            created_at: movement.created_at,
            id: movement.id,
        }
    }

    fn sort_key(&self) -> (i64, MovementId) {
        (
            self.created_at.timestamp_micros(),
            self.id,
        )
    }

    /// Whether `movement` comes strictly after this cursor in
    /// most-recent-first order (i.e. is strictly older).
    pub fn precedes(&self, movement: &Movement) -> bool {
        MovementCursor::of(movement).sort_key() < self.sort_key()
    }
}

impl core::fmt::Display for MovementCursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.created_at.timestamp_micros(), self.id)
    }
}

impl FromStr for MovementCursor {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (micros, id) = s
            .split_once(':')
            .ok_or_else(|| StockError::validation("malformed cursor"))?;
        let micros: i64 = micros
            .parse()
            .map_err(|_| StockError::validation("malformed cursor timestamp"))?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(micros)
            .ok_or_else(|| StockError::validation("cursor timestamp out of range"))?;
        let id: MovementId = id.parse()?;
        Ok(Self { created_at, id })
    }
}

/// Optional product filter for ledger reads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MovementFilter {
    #[default]
    All,
    Product(ProductId),
}

impl MovementFilter {
    fn accepts(self, movement: &Movement) -> bool {
        match self {
            MovementFilter::All => true,
            MovementFilter::Product(id) => movement.product_id == id,
        }
    }
}

/// One page of a most-recent-first ledger read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPage {
    pub movements: Vec<Movement>,
    /// Cursor to resume from, absent on the last page.
    pub next_cursor: Option<MovementCursor>,
}

/// Persistence boundary for the ledger: append-only movements plus the
/// projection rows advanced transactionally alongside each insert.
///
/// Implementations must:
/// - commit the movement insert and the projection advance atomically
/// - enforce the caller's `ExpectedVersion` against the projection row
/// - never mutate or delete committed movements
pub trait MovementStore: Send + Sync {
    /// Atomically insert `movement` and advance the product's projection to
    /// `movement.new_stock`, conditioned on `expected` matching the current
    /// projection version. Fails with `StockError::Concurrency` on a stale
    /// expectation.
    fn commit(&self, movement: Movement, expected: ExpectedVersion) -> StockResult<Movement>;

    /// Current projection row for one product.
    fn projection(&self, product_id: ProductId) -> Option<StockProjection>;

    /// All projection rows, ordered by product id.
    fn projections(&self) -> Vec<StockProjection>;

    /// Full movement history for one product, oldest-first (replay order).
    fn history(&self, product_id: ProductId) -> Vec<Movement>;

    /// Look up a committed movement by its idempotency key.
    fn find_by_reference(
        &self,
        product_id: ProductId,
        movement_type: MovementType,
        reference: MovementReference,
    ) -> Option<Movement>;

    /// Most-recent-first page of movements, restartable via `cursor`.
    fn page(
        &self,
        filter: MovementFilter,
        limit: usize,
        cursor: Option<MovementCursor>,
    ) -> MovementPage;
}

impl<S> MovementStore for std::sync::Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn commit(&self, movement: Movement, expected: ExpectedVersion) -> StockResult<Movement> {
        (**self).commit(movement, expected)
    }

    fn projection(&self, product_id: ProductId) -> Option<StockProjection> {
        (**self).projection(product_id)
    }

    fn projections(&self) -> Vec<StockProjection> {
        (**self).projections()
    }

    fn history(&self, product_id: ProductId) -> Vec<Movement> {
        (**self).history(product_id)
    }

    fn find_by_reference(
        &self,
        product_id: ProductId,
        movement_type: MovementType,
        reference: MovementReference,
    ) -> Option<Movement> {
        (**self).find_by_reference(product_id, movement_type, reference)
    }

    fn page(
        &self,
        filter: MovementFilter,
        limit: usize,
        cursor: Option<MovementCursor>,
    ) -> MovementPage {
        (**self).page(filter, limit, cursor)
    }
}

pub(crate) fn page_of(
    mut candidates: Vec<Movement>,
    filter: MovementFilter,
    limit: usize,
    cursor: Option<MovementCursor>,
) -> MovementPage {
    candidates.retain(|m| filter.accepts(m));
    if let Some(cursor) = cursor {
        candidates.retain(|m| cursor.precedes(m));
    }

    // Most-recent-first, ties broken by id so pagination is stable.
    candidates.sort_by_key(|m| std::cmp::Reverse((m.created_at.timestamp_micros(), m.id)));

    let has_more = candidates.len() > limit;
    candidates.truncate(limit);

    let next_cursor = if has_more {
        candidates.last().map(MovementCursor::of)
    } else {
        None
    };

    MovementPage {
        movements: candidates,
        next_cursor,
    }
}
