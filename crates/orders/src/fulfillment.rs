use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use stockward_core::{OrderId, StockError, StockResult, UserId};
use stockward_ledger::{
    AppendMovement, MovementReference, MovementStore, MovementType, StockLedger, StockWrite,
};

use crate::order::{Order, OrderLine, OrderStatus};
use crate::store::OrderStore;

/// Coordinates order lifecycle with the stock ledger.
///
/// Stock is reserved at creation: one order-referenced `sale_out` per line,
/// treated as a single all-or-nothing unit. A later cancellation releases
/// the reservation through compensating `return` movements: new forward
/// events, never edits of the originals.
#[derive(Debug)]
pub struct FulfillmentService<M, O> {
    ledger: Arc<StockLedger<M>>,
    orders: O,
}

impl<M, O> FulfillmentService<M, O>
where
    M: MovementStore,
    O: OrderStore,
{
    pub fn new(ledger: Arc<StockLedger<M>>, orders: O) -> Self {
        Self { ledger, orders }
    }

    /// Create an order in `pending`, decrementing stock for every line.
    ///
    /// Two phases: validate every line against the current projections,
    /// then commit the decrements. If a commit still fails mid-sequence
    /// (a concurrent writer won a race after validation), the already
    /// committed decrements are reversed with compensating returns and the
    /// whole creation fails, leaving no partially created order and no net
    /// stock change.
    pub fn create_order(
        &self,
        buyer: impl Into<String>,
        lines: Vec<OrderLine>,
        user_id: UserId,
    ) -> StockResult<Order> {
        let buyer = buyer.into();
        if buyer.trim().is_empty() {
            return Err(StockError::validation("buyer is required"));
        }
        if lines.is_empty() {
            return Err(StockError::validation("an order needs at least one line"));
        }
        let mut seen = HashSet::new();
        for line in &lines {
            if line.quantity <= 0 {
                return Err(StockError::validation("line quantity must be positive"));
            }
            if !seen.insert(line.product_id) {
                return Err(StockError::validation(format!(
                    "product {} appears on more than one line",
                    line.product_id
                )));
            }
        }

        // Stage: every line must be satisfiable right now. Not authoritative
        // (a concurrent writer may still win), but it keeps the common
        // failure cheap and free of compensating noise in the ledger.
        for line in &lines {
            let available = self.ledger.current_stock(line.product_id)?;
            if available < line.quantity {
                return Err(StockError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }

        let order_id = OrderId::new();

        let mut committed: Vec<OrderLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            let result = self.ledger.append(AppendMovement {
                product_id: line.product_id,
                movement_type: MovementType::SaleOut,
                write: StockWrite::Delta(-line.quantity),
                reference: MovementReference::Order(order_id),
                notes: format!("order {order_id}"),
                user_id,
            });
            match result {
                Ok(_) => committed.push(*line),
                Err(err) => {
                    self.compensate(order_id, &committed, user_id);
                    return Err(err);
                }
            }
        }

        let order = Order::new(order_id, buyer, lines, user_id, Utc::now());
        if let Err(err) = self.orders.insert(order.clone()) {
            self.compensate(order_id, &committed, user_id);
            return Err(err);
        }

        tracing::info!(order_id = %order_id, lines = order.lines.len(), "order created");
        Ok(order)
    }

    /// Apply a status transition.
    ///
    /// Illegal transitions are rejected with no side effects. Transitioning
    /// to `cancelled` first appends one compensating `return` per line
    /// (idempotent via the order reference), then flips the status.
    pub fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        user_id: UserId,
    ) -> StockResult<Order> {
        let mut order = self
            .orders
            .get(order_id)
            .ok_or_else(|| StockError::not_found(format!("order {order_id} not found")))?;

        if !order.status.can_transition_to(next) {
            return Err(StockError::InvalidTransition {
                from: order.status.to_string(),
                to: next.to_string(),
            });
        }

        if next == OrderStatus::Cancelled {
            // Restore the reservation before the status flips. Idempotent:
            // a retried cancellation finds the committed returns and skips.
            for line in order.lines.clone() {
                self.ledger.append(AppendMovement {
                    product_id: line.product_id,
                    movement_type: MovementType::Return,
                    write: StockWrite::Delta(line.quantity),
                    reference: MovementReference::Order(order_id),
                    notes: format!("cancellation of order {order_id}"),
                    user_id,
                })?;
            }
        }

        order.transition(next, user_id, Utc::now())?;
        self.orders.update(order.clone())?;

        tracing::info!(order_id = %order_id, status = %next, "order status updated");
        Ok(order)
    }

    pub fn get(&self, order_id: OrderId) -> StockResult<Order> {
        self.orders
            .get(order_id)
            .ok_or_else(|| StockError::not_found(format!("order {order_id} not found")))
    }

    pub fn list(&self) -> Vec<Order> {
        self.orders.list()
    }

    /// Reverse already-committed decrements of a failed creation. Best
    /// effort: a failed compensation leaves an auditable gap that the
    /// periodic ledger audit will not flag (the chain itself stays sound),
    /// so it is logged loudly for manual follow-up.
    fn compensate(&self, order_id: OrderId, committed: &[OrderLine], user_id: UserId) {
        for line in committed {
            let result = self.ledger.append(AppendMovement {
                product_id: line.product_id,
                movement_type: MovementType::Return,
                write: StockWrite::Delta(line.quantity),
                reference: MovementReference::Order(order_id),
                notes: format!("reversal of aborted order {order_id}"),
                user_id,
            });
            if let Err(err) = result {
                tracing::error!(
                    order_id = %order_id,
                    product_id = %line.product_id,
                    "failed to compensate aborted order line: {err}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use stockward_core::{ProductId, StockResult};
    use stockward_ledger::{
        ExpectedVersion, InMemoryMovementStore, Movement, MovementCursor, MovementFilter,
        MovementPage, StockProjection,
    };

    use crate::store::InMemoryOrderStore;

    use super::*;

    type Service = FulfillmentService<Arc<InMemoryMovementStore>, Arc<InMemoryOrderStore>>;

    fn service() -> (Service, Arc<StockLedger<Arc<InMemoryMovementStore>>>) {
        let ledger = Arc::new(StockLedger::new(Arc::new(InMemoryMovementStore::new())));
        let service = FulfillmentService::new(Arc::clone(&ledger), Arc::new(InMemoryOrderStore::new()));
        (service, ledger)
    }

    fn line(product_id: ProductId, quantity: i64) -> OrderLine {
        OrderLine {
            product_id,
            quantity,
        }
    }

    #[test]
    fn creation_reserves_stock_and_persists_a_pending_order() {
        let (service, ledger) = service();
        let user = UserId::new();
        let product_a = ProductId::new();
        let product_b = ProductId::new();
        ledger.initialize(product_a, 10, user).unwrap();
        ledger.initialize(product_b, 4, user).unwrap();

        let order = service
            .create_order("Bakkerij Jansen", vec![line(product_a, 5), line(product_b, 1)], user)
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(ledger.current_stock(product_a).unwrap(), 5);
        assert_eq!(ledger.current_stock(product_b).unwrap(), 3);

        let stored = service.get(order.id).unwrap();
        assert_eq!(stored, order);
    }

    #[test]
    fn creation_fails_entirely_when_one_line_cannot_be_satisfied() {
        let (service, ledger) = service();
        let user = UserId::new();
        let product_a = ProductId::new();
        let product_b = ProductId::new();
        ledger.initialize(product_a, 50, user).unwrap();
        ledger.initialize(product_b, 20, user).unwrap();

        let err = service
            .create_order("Cafe Roux", vec![line(product_a, 5), line(product_b, 1000)], user)
            .unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { .. }));

        // No partial decrement, no partially created order.
        assert_eq!(ledger.current_stock(product_a).unwrap(), 50);
        assert_eq!(ledger.current_stock(product_b).unwrap(), 20);
        assert!(service.list().is_empty());
        // Product A's ledger carries only its initial movement.
        assert_eq!(
            ledger
                .movements(MovementFilter::Product(product_a), 10, None)
                .movements
                .len(),
            1
        );
    }

    #[test]
    fn input_validation_rejects_bad_orders() {
        let (service, ledger) = service();
        let user = UserId::new();
        let product = ProductId::new();
        ledger.initialize(product, 10, user).unwrap();

        assert!(matches!(
            service.create_order("  ", vec![line(product, 1)], user),
            Err(StockError::Validation(_))
        ));
        assert!(matches!(
            service.create_order("Buyer", vec![], user),
            Err(StockError::Validation(_))
        ));
        assert!(matches!(
            service.create_order("Buyer", vec![line(product, 0)], user),
            Err(StockError::Validation(_))
        ));
        assert!(matches!(
            service.create_order("Buyer", vec![line(product, 1), line(product, 2)], user),
            Err(StockError::Validation(_))
        ));
    }

    #[test]
    fn cancellation_restores_stock_through_compensating_returns() {
        let (service, ledger) = service();
        let user = UserId::new();
        let product_a = ProductId::new();
        let product_c = ProductId::new();
        ledger.initialize(product_a, 12, user).unwrap();
        ledger.initialize(product_c, 7, user).unwrap();

        let order = service
            .create_order("Hotel Flora", vec![line(product_a, 5), line(product_c, 2)], user)
            .unwrap();
        service
            .update_status(order.id, OrderStatus::Confirmed, user)
            .unwrap();

        let cancelled = service
            .update_status(order.id, OrderStatus::Cancelled, user)
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        // Pre-order values restored via forward-only return movements.
        assert_eq!(ledger.current_stock(product_a).unwrap(), 12);
        assert_eq!(ledger.current_stock(product_c).unwrap(), 7);

        let history = ledger.movements(MovementFilter::Product(product_a), 10, None);
        let types: Vec<_> = history.movements.iter().map(|m| m.movement_type).collect();
        assert!(types.contains(&MovementType::Return));
        assert!(types.contains(&MovementType::SaleOut));
        ledger.verify(product_a).unwrap();
        ledger.verify(product_c).unwrap();
    }

    #[test]
    fn retried_cancellation_does_not_double_restore() {
        let (service, ledger) = service();
        let user = UserId::new();
        let product = ProductId::new();
        ledger.initialize(product, 10, user).unwrap();

        let order = service
            .create_order("Deli Marta", vec![line(product, 4)], user)
            .unwrap();
        service
            .update_status(order.id, OrderStatus::Cancelled, user)
            .unwrap();
        assert_eq!(ledger.current_stock(product).unwrap(), 10);

        // A second cancellation is an illegal transition; even if the
        // returns were re-attempted they would be deduplicated by the
        // order reference.
        assert!(matches!(
            service.update_status(order.id, OrderStatus::Cancelled, user),
            Err(StockError::InvalidTransition { .. })
        ));
        assert_eq!(ledger.current_stock(product).unwrap(), 10);
    }

    #[test]
    fn delivered_orders_are_immutable() {
        let (service, ledger) = service();
        let user = UserId::new();
        let product = ProductId::new();
        ledger.initialize(product, 10, user).unwrap();

        let order = service
            .create_order("Deli Marta", vec![line(product, 1)], user)
            .unwrap();
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::InProduction,
            OrderStatus::ReadyForDispatch,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            service.update_status(order.id, next, user).unwrap();
        }

        let err = service
            .update_status(order.id, OrderStatus::Pending, user)
            .unwrap_err();
        assert!(matches!(err, StockError::InvalidTransition { .. }));

        let stored = service.get(order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Delivered);
        // History records each hop with a timestamp.
        assert_eq!(stored.status_history.len(), 6);
    }

    #[test]
    fn unknown_order_is_not_found() {
        let (service, _ledger) = service();
        let err = service
            .update_status(OrderId::new(), OrderStatus::Confirmed, UserId::new())
            .unwrap_err();
        assert!(matches!(err, StockError::NotFound(_)));
    }

    /// Store wrapper that loses every race for one product's `sale_out`
    /// commits, forcing the post-validation compensation path.
    struct ContendedStore {
        inner: Arc<InMemoryMovementStore>,
        contested: ProductId,
    }

    impl MovementStore for ContendedStore {
        fn commit(&self, movement: Movement, expected: ExpectedVersion) -> StockResult<Movement> {
            if movement.product_id == self.contested
                && movement.movement_type == MovementType::SaleOut
            {
                return Err(StockError::concurrency("simulated lost race"));
            }
            self.inner.commit(movement, expected)
        }
        fn projection(&self, product_id: ProductId) -> Option<StockProjection> {
            self.inner.projection(product_id)
        }
        fn projections(&self) -> Vec<StockProjection> {
            self.inner.projections()
        }
        fn history(&self, product_id: ProductId) -> Vec<Movement> {
            self.inner.history(product_id)
        }
        fn find_by_reference(
            &self,
            product_id: ProductId,
            movement_type: MovementType,
            reference: MovementReference,
        ) -> Option<Movement> {
            self.inner.find_by_reference(product_id, movement_type, reference)
        }
        fn page(
            &self,
            filter: MovementFilter,
            limit: usize,
            cursor: Option<MovementCursor>,
        ) -> MovementPage {
            self.inner.page(filter, limit, cursor)
        }
    }

    #[test]
    fn mid_sequence_commit_failure_compensates_earlier_lines() {
        let inner = Arc::new(InMemoryMovementStore::new());
        let user = UserId::new();
        let product_a = ProductId::new();
        let product_b = ProductId::new();
        {
            let seed = StockLedger::new(Arc::clone(&inner));
            seed.initialize(product_a, 10, user).unwrap();
            seed.initialize(product_b, 10, user).unwrap();
        }

        let ledger = Arc::new(StockLedger::new(ContendedStore {
            inner: Arc::clone(&inner),
            contested: product_b,
        }));
        let service = FulfillmentService::new(Arc::clone(&ledger), Arc::new(InMemoryOrderStore::new()));

        let err = service
            .create_order("Cafe Roux", vec![line(product_a, 3), line(product_b, 3)], user)
            .unwrap_err();
        assert!(matches!(err, StockError::Concurrency(_)));

        // Line A was decremented, then reversed by a compensating return.
        assert_eq!(ledger.current_stock(product_a).unwrap(), 10);
        assert_eq!(ledger.current_stock(product_b).unwrap(), 10);
        let types: Vec<_> = inner
            .history(product_a)
            .iter()
            .map(|m| m.movement_type)
            .collect();
        assert_eq!(
            types,
            vec![MovementType::Initial, MovementType::SaleOut, MovementType::Return]
        );
        assert!(service.list().is_empty());
    }
}
