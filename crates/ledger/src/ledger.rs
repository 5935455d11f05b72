use chrono::Utc;

use stockward_core::{MovementId, ProductId, PurchaseId, StockError, StockResult, UserId};

use crate::movement::{Movement, MovementReference, MovementType};
use crate::projection::StockProjection;
use crate::store::{
    ExpectedVersion, MovementCursor, MovementFilter, MovementPage, MovementStore,
};

/// Bounded retry budget for the read-compute-commit cycle. Conflicts beyond
/// this surface as `StockError::Concurrency` for client-side retry.
const MAX_COMMIT_RETRIES: usize = 5;

/// How the new stock level is derived from the current projection.
///
/// `SetTo` exists so a `set` adjustment recomputes its delta against the
/// freshly read quantity on every optimistic retry, instead of carrying a
/// delta that went stale under contention.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockWrite {
    /// Apply a signed delta to the current quantity.
    Delta(i64),
    /// Drive the quantity to an absolute target value.
    SetTo(i64),
}

/// One append request. Built by the producing component (adjustment
/// gateway, order fulfillment, purchase receiving), committed by the ledger.
#[derive(Debug, Clone)]
pub struct AppendMovement {
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub write: StockWrite,
    pub reference: MovementReference,
    pub notes: String,
    pub user_id: UserId,
}

/// The stock ledger: the only component that mutates quantity.
///
/// Every change goes through [`StockLedger::append`], which linearizes
/// concurrent writers per product via an optimistic version check on the
/// projection row. Different products never contend with each other.
#[derive(Debug)]
pub struct StockLedger<S> {
    store: S,
}

impl<S> StockLedger<S>
where
    S: MovementStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append one movement: read the projection, compute the candidate,
    /// commit conditioned on the projection version being unchanged.
    ///
    /// Order-referenced `sale_out`/`return` appends are idempotent: if a
    /// movement with the same `(product, type, reference)` key already
    /// exists, it is returned unchanged and stock is not touched again.
    pub fn append(&self, request: AppendMovement) -> StockResult<Movement> {
        let order_keyed = matches!(request.reference, MovementReference::Order(_))
            && matches!(
                request.movement_type,
                MovementType::SaleOut | MovementType::Return
            );

        for _attempt in 0..MAX_COMMIT_RETRIES {
            // Re-checked on every attempt: a concurrent writer carrying the
            // same key may have committed between our lookup and our commit,
            // in which case the version conflict sends us back here.
            if order_keyed {
                if let Some(existing) = self.store.find_by_reference(
                    request.product_id,
                    request.movement_type,
                    request.reference,
                ) {
                    tracing::debug!(
                        product_id = %request.product_id,
                        movement_id = %existing.id,
                        movement_type = %request.movement_type,
                        "duplicate order-referenced append, returning committed movement"
                    );
                    return Ok(existing);
                }
            }

            let projection = self.store.projection(request.product_id);

            let (current, expected) = match &projection {
                Some(p) => (p.quantity, ExpectedVersion::Exact(p.version)),
                None => (0, ExpectedVersion::Absent),
            };

            if projection.is_none() && request.movement_type != MovementType::Initial {
                return Err(StockError::not_found(format!(
                    "no stock projection for product {} (record an initial movement first)",
                    request.product_id
                )));
            }
            if projection.is_some() && request.movement_type == MovementType::Initial {
                return Err(StockError::validation(format!(
                    "product {} already has an initial movement",
                    request.product_id
                )));
            }

            let new_stock = match request.write {
                StockWrite::Delta(delta) => current.checked_add(delta).ok_or_else(|| {
                    StockError::validation(format!(
                        "delta {delta} overflows the stock quantity for product {}",
                        request.product_id
                    ))
                })?,
                StockWrite::SetTo(target) => target,
            };
            let delta = new_stock - current;

            if !request.movement_type.allows_delta(delta) {
                return Err(StockError::validation(format!(
                    "delta {delta} violates the sign convention for {} movements",
                    request.movement_type
                )));
            }
            if new_stock < 0 {
                return Err(StockError::InsufficientStock {
                    product_id: request.product_id,
                    requested: delta.saturating_abs(),
                    available: current,
                });
            }

            let movement = Movement {
                id: MovementId::new(),
                product_id: request.product_id,
                movement_type: request.movement_type,
                quantity_delta: delta,
                previous_stock: current,
                new_stock,
                reference: request.reference,
                notes: request.notes.clone(),
                user_id: request.user_id,
                created_at: Utc::now(),
            };

            match self.store.commit(movement, expected) {
                Ok(committed) => {
                    tracing::debug!(
                        product_id = %committed.product_id,
                        movement_id = %committed.id,
                        movement_type = %committed.movement_type,
                        delta = committed.quantity_delta,
                        new_stock = committed.new_stock,
                        "movement committed"
                    );
                    return Ok(committed);
                }
                // Lost the race; re-read and recompute.
                Err(StockError::Concurrency(_)) => continue,
                Err(other) => return Err(other),
            }
        }

        Err(StockError::concurrency(format!(
            "gave up appending {} movement for product {} after {MAX_COMMIT_RETRIES} attempts",
            request.movement_type, request.product_id
        )))
    }

    /// Record a product's first movement, creating its projection.
    pub fn initialize(
        &self,
        product_id: ProductId,
        quantity: i64,
        user_id: UserId,
    ) -> StockResult<Movement> {
        if quantity < 0 {
            return Err(StockError::validation("initial quantity cannot be negative"));
        }
        self.append(AppendMovement {
            product_id,
            movement_type: MovementType::Initial,
            write: StockWrite::Delta(quantity),
            reference: MovementReference::None,
            notes: "initial stock".to_string(),
            user_id,
        })
    }

    /// Record received supplier stock (`purchase_in`).
    pub fn receive(
        &self,
        product_id: ProductId,
        quantity: i64,
        purchase_id: PurchaseId,
        notes: impl Into<String>,
        user_id: UserId,
    ) -> StockResult<Movement> {
        if quantity < 0 {
            return Err(StockError::validation("received quantity cannot be negative"));
        }
        self.append(AppendMovement {
            product_id,
            movement_type: MovementType::PurchaseIn,
            write: StockWrite::Delta(quantity),
            reference: MovementReference::Purchase(purchase_id),
            notes: notes.into(),
            user_id,
        })
    }

    /// Projection value for one product.
    pub fn current_stock(&self, product_id: ProductId) -> StockResult<i64> {
        self.store
            .projection(product_id)
            .map(|p| p.quantity)
            .ok_or_else(|| {
                StockError::not_found(format!("no stock projection for product {product_id}"))
            })
    }

    /// All projection rows, for overview views and audit sweeps.
    pub fn projections(&self) -> Vec<StockProjection> {
        self.store.projections()
    }

    /// Recovery path: recompute the quantity by replaying all movements from
    /// the `initial` one forward and summing deltas.
    pub fn replay_stock(&self, product_id: ProductId) -> StockResult<i64> {
        let history = self.store.history(product_id);
        if history.is_empty() {
            return Err(StockError::not_found(format!(
                "no movements recorded for product {product_id}"
            )));
        }
        Ok(history.iter().map(|m| m.quantity_delta).sum())
    }

    /// Paginated, most-recent-first ledger read.
    pub fn movements(
        &self,
        filter: MovementFilter,
        limit: usize,
        cursor: Option<MovementCursor>,
    ) -> MovementPage {
        self.store.page(filter, limit, cursor)
    }

    /// Audit one product's chain against the five ledger invariants.
    ///
    /// A violation is fatal and reported, never repaired: the ledger is the
    /// record of what happened, and a projection that disagrees with it
    /// requires manual reconciliation.
    pub fn verify(&self, product_id: ProductId) -> StockResult<()> {
        let history = self.store.history(product_id);
        let projection = self.store.projection(product_id);

        let Some(projection) = projection else {
            if history.is_empty() {
                return Ok(());
            }
            return self.fail_audit(product_id, "movements exist but projection row is missing");
        };
        if history.is_empty() {
            return self.fail_audit(product_id, "projection row exists without any movements");
        }

        if history[0].movement_type != MovementType::Initial {
            return self.fail_audit(product_id, "first movement is not of type initial");
        }

        let mut expected_previous = 0i64;
        for m in &history {
            if m.previous_stock != expected_previous {
                return self.fail_audit(
                    product_id,
                    format!(
                        "gap in chain at movement {}: previous_stock {} != prior new_stock {}",
                        m.id, m.previous_stock, expected_previous
                    ),
                );
            }
            if !m.is_arithmetically_sound() {
                return self.fail_audit(
                    product_id,
                    format!("movement {} fails previous + delta == new (>= 0)", m.id),
                );
            }
            expected_previous = m.new_stock;
        }

        let replayed: i64 = history.iter().map(|m| m.quantity_delta).sum();
        if projection.quantity != expected_previous || projection.quantity != replayed {
            return self.fail_audit(
                product_id,
                format!(
                    "projection {} disagrees with chain head {} / replayed sum {}",
                    projection.quantity, expected_previous, replayed
                ),
            );
        }

        Ok(())
    }

    /// Periodic audit sweep over every product with a projection.
    pub fn verify_all(&self) -> Vec<(ProductId, StockError)> {
        self.store
            .projections()
            .into_iter()
            .filter_map(|p| self.verify(p.product_id).err().map(|e| (p.product_id, e)))
            .collect()
    }

    fn fail_audit(&self, product_id: ProductId, msg: impl Into<String>) -> StockResult<()> {
        let msg = msg.into();
        tracing::error!(product_id = %product_id, "ledger audit failed: {msg}");
        Err(StockError::integrity(format!("product {product_id}: {msg}")))
    }
}
