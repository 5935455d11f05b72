use std::collections::HashMap;
use std::sync::RwLock;

use stockward_core::{ProductId, StockError, StockResult};

use crate::movement::{Movement, MovementReference, MovementType};
use crate::projection::StockProjection;
use crate::store::{
    page_of, ExpectedVersion, MovementCursor, MovementFilter, MovementPage, MovementStore,
};

#[derive(Debug, Default)]
struct Inner {
    /// Global append order; per-product history is a filtered view.
    movements: Vec<Movement>,
    projections: HashMap<ProductId, StockProjection>,
}

/// In-memory movement store.
///
/// Intended for tests/dev. The single write lock makes the
/// insert-plus-projection-advance pair atomic; a SQL implementation would
/// use a transaction with a conditional `UPDATE ... WHERE version = ?`.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<Inner>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MovementStore for InMemoryMovementStore {
    fn commit(&self, movement: Movement, expected: ExpectedVersion) -> StockResult<Movement> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StockError::integrity("movement store lock poisoned"))?;

        let current = inner.projections.get(&movement.product_id);
        expected.check(current.map(|p| p.version))?;

        // Defense in depth: the version check implies chain continuity, but a
        // movement built against a different snapshot must never land.
        let current_quantity = current.map(|p| p.quantity).unwrap_or(0);
        if movement.previous_stock != current_quantity {
            return Err(StockError::concurrency(format!(
                "stale previous_stock (movement: {}, projection: {})",
                movement.previous_stock, current_quantity
            )));
        }
        if !movement.is_arithmetically_sound() {
            return Err(StockError::integrity(format!(
                "movement arithmetic does not hold: {} + {} != {} (or negative)",
                movement.previous_stock, movement.quantity_delta, movement.new_stock
            )));
        }

        let next_version = current.map(|p| p.version + 1).unwrap_or(1);
        inner.projections.insert(
            movement.product_id,
            StockProjection {
                product_id: movement.product_id,
                quantity: movement.new_stock,
                version: next_version,
                last_updated: movement.created_at,
            },
        );
        inner.movements.push(movement.clone());

        Ok(movement)
    }

    fn projection(&self, product_id: ProductId) -> Option<StockProjection> {
        self.inner
            .read()
            .ok()
            .and_then(|i| i.projections.get(&product_id).cloned())
    }

    fn projections(&self) -> Vec<StockProjection> {
        let mut all: Vec<StockProjection> = self
            .inner
            .read()
            .map(|i| i.projections.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by_key(|p| p.product_id);
        all
    }

    fn history(&self, product_id: ProductId) -> Vec<Movement> {
        self.inner
            .read()
            .map(|i| {
                i.movements
                    .iter()
                    .filter(|m| m.product_id == product_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_by_reference(
        &self,
        product_id: ProductId,
        movement_type: MovementType,
        reference: MovementReference,
    ) -> Option<Movement> {
        self.inner.read().ok().and_then(|i| {
            i.movements
                .iter()
                .find(|m| {
                    m.product_id == product_id
                        && m.movement_type == movement_type
                        && m.reference == reference
                })
                .cloned()
        })
    }

    fn page(
        &self,
        filter: MovementFilter,
        limit: usize,
        cursor: Option<MovementCursor>,
    ) -> MovementPage {
        let candidates = self
            .inner
            .read()
            .map(|i| i.movements.clone())
            .unwrap_or_default();
        page_of(candidates, filter, limit, cursor)
    }
}
