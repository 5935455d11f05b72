use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockward_core::{OrderId, ProductId, StockError, StockResult, UserId};

/// Order fulfillment status.
///
/// The forward chain is `pending → confirmed → in-production →
/// ready-for-dispatch → shipped → delivered`; `cancelled` is reachable from
/// every non-terminal state. `delivered` and `cancelled` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProduction,
    ReadyForDispatch,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Next status on the forward chain, if any.
    fn successor(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::InProduction),
            OrderStatus::InProduction => Some(OrderStatus::ReadyForDispatch),
            OrderStatus::ReadyForDispatch => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Whether the state graph has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Cancelled {
            return true;
        }
        self.successor() == Some(next)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProduction => "in-production",
            OrderStatus::ReadyForDispatch => "ready-for-dispatch",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One order line: product and quantity to reserve.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Timestamped entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: UserId,
}

/// A customer order. Created in `pending`, mutated only through legal
/// status transitions, immutable once `delivered` or `cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer: String,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub status_history: Vec<StatusChange>,
}

impl Order {
    pub fn new(
        id: OrderId,
        buyer: String,
        lines: Vec<OrderLine>,
        user_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            buyer,
            lines,
            status: OrderStatus::Pending,
            created_at,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                changed_at: created_at,
                changed_by: user_id,
            }],
        }
    }

    /// Validate and apply a status transition, recording it in the history.
    /// Illegal transitions fail with `InvalidTransition` and change nothing.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> StockResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(StockError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.status_history.push(StatusChange {
            status: next,
            changed_at: at,
            changed_by: user_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_status(status: OrderStatus) -> Order {
        let mut order = Order::new(
            OrderId::new(),
            "Bakkerij Jansen".to_string(),
            vec![OrderLine {
                product_id: ProductId::new(),
                quantity: 2,
            }],
            UserId::new(),
            Utc::now(),
        );
        order.status = status;
        order
    }

    #[test]
    fn forward_chain_is_walkable_end_to_end() {
        let mut order = order_with_status(OrderStatus::Pending);
        let user = UserId::new();
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::InProduction,
            OrderStatus::ReadyForDispatch,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            order.transition(next, user, Utc::now()).unwrap();
            assert_eq!(order.status, next);
        }
        // Pending seed + five transitions.
        assert_eq!(order.status_history.len(), 6);
    }

    #[test]
    fn no_reverse_edges_and_no_skipping() {
        let mut order = order_with_status(OrderStatus::Shipped);
        let user = UserId::new();
        assert!(matches!(
            order.transition(OrderStatus::Confirmed, user, Utc::now()),
            Err(StockError::InvalidTransition { .. })
        ));

        let mut order = order_with_status(OrderStatus::Pending);
        assert!(matches!(
            order.transition(OrderStatus::Shipped, user, Utc::now()),
            Err(StockError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn cancelled_is_reachable_from_every_non_terminal_state() {
        let user = UserId::new();
        for from in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::InProduction,
            OrderStatus::ReadyForDispatch,
            OrderStatus::Shipped,
        ] {
            let mut order = order_with_status(from);
            order.transition(OrderStatus::Cancelled, user, Utc::now()).unwrap();
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        let user = UserId::new();
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            let mut order = order_with_status(terminal);
            for next in [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Cancelled,
                OrderStatus::Delivered,
            ] {
                let before = order.clone();
                assert!(matches!(
                    order.transition(next, user, Utc::now()),
                    Err(StockError::InvalidTransition { .. })
                ));
                // No side effects on rejection.
                assert_eq!(order, before);
            }
        }
    }

    #[test]
    fn status_wire_form_is_kebab_case() {
        let json = serde_json::to_string(&OrderStatus::ReadyForDispatch).unwrap();
        assert_eq!(json, "\"ready-for-dispatch\"");
        let json = serde_json::to_string(&OrderStatus::InProduction).unwrap();
        assert_eq!(json, "\"in-production\"");
    }
}
