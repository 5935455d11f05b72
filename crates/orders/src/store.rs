use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use stockward_core::{OrderId, StockError, StockResult};

use crate::order::Order;

/// Persistence boundary for orders.
pub trait OrderStore: Send + Sync {
    /// Insert a new order. Fails if the id is already taken.
    fn insert(&self, order: Order) -> StockResult<()>;

    /// Replace a stored order (status transitions).
    fn update(&self, order: Order) -> StockResult<()>;

    fn get(&self, order_id: OrderId) -> Option<Order>;

    /// All orders, newest-first.
    fn list(&self) -> Vec<Order>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert(&self, order: Order) -> StockResult<()> {
        (**self).insert(order)
    }

    fn update(&self, order: Order) -> StockResult<()> {
        (**self).update(order)
    }

    fn get(&self, order_id: OrderId) -> Option<Order> {
        (**self).get(order_id)
    }

    fn list(&self) -> Vec<Order> {
        (**self).list()
    }
}

/// In-memory order store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) -> StockResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| StockError::integrity("order store lock poisoned"))?;
        if orders.contains_key(&order.id) {
            return Err(StockError::concurrency(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    fn update(&self, order: Order) -> StockResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| StockError::integrity("order store lock poisoned"))?;
        if !orders.contains_key(&order.id) {
            return Err(StockError::not_found(format!("order {} not found", order.id)));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    fn get(&self, order_id: OrderId) -> Option<Order> {
        self.orders
            .read()
            .ok()
            .and_then(|o| o.get(&order_id).cloned())
    }

    fn list(&self) -> Vec<Order> {
        let mut all: Vec<Order> = self
            .orders
            .read()
            .map(|o| o.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by_key(|o| std::cmp::Reverse((o.created_at, o.id)));
        all
    }
}
