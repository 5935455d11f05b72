use serde::{Deserialize, Serialize};

use stockward_core::{ProductId, StockError, StockResult, UserId};

use crate::ledger::{AppendMovement, StockLedger, StockWrite};
use crate::movement::{Movement, MovementReference, MovementType};
use crate::store::MovementStore;

/// How a manual correction changes the quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Increase,
    Decrease,
    Set,
}

/// Validates manual stock corrections and translates them into ledger
/// movements. The gateway never touches quantity itself; it only builds
/// `adjustment` append requests.
#[derive(Debug)]
pub struct AdjustmentGateway<S> {
    ledger: std::sync::Arc<StockLedger<S>>,
}

impl<S> AdjustmentGateway<S>
where
    S: MovementStore,
{
    pub fn new(ledger: std::sync::Arc<StockLedger<S>>) -> Self {
        Self { ledger }
    }

    /// Apply a manual correction.
    ///
    /// `notes` is the mandatory audit trail; a blank value is rejected
    /// before the ledger is touched. A decrease (or set) below zero is
    /// rejected with `InsufficientStock`, never clamped.
    pub fn adjust(
        &self,
        product_id: ProductId,
        quantity: i64,
        adjustment_type: AdjustmentType,
        notes: impl Into<String>,
        user_id: UserId,
    ) -> StockResult<Movement> {
        let notes = notes.into();
        if notes.trim().is_empty() {
            return Err(StockError::validation(
                "adjustment notes are required for the audit trail",
            ));
        }
        if quantity < 0 {
            return Err(StockError::validation("adjustment quantity cannot be negative"));
        }

        let write = match adjustment_type {
            AdjustmentType::Increase => StockWrite::Delta(quantity),
            AdjustmentType::Decrease => StockWrite::Delta(-quantity),
            // Delta is derived from the freshly read stock inside the
            // ledger's retry loop.
            AdjustmentType::Set => StockWrite::SetTo(quantity),
        };

        self.ledger.append(AppendMovement {
            product_id,
            movement_type: MovementType::Adjustment,
            write,
            reference: MovementReference::None,
            notes,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::in_memory::InMemoryMovementStore;

    use super::*;

    fn gateway() -> (AdjustmentGateway<Arc<InMemoryMovementStore>>, Arc<StockLedger<Arc<InMemoryMovementStore>>>) {
        let ledger = Arc::new(StockLedger::new(Arc::new(InMemoryMovementStore::new())));
        (AdjustmentGateway::new(Arc::clone(&ledger)), ledger)
    }

    #[test]
    fn blank_notes_are_rejected_before_the_ledger_is_touched() {
        let (gateway, ledger) = gateway();
        let product = ProductId::new();
        let user = UserId::new();
        ledger.initialize(product, 10, user).unwrap();

        let err = gateway
            .adjust(product, 5, AdjustmentType::Increase, "   ", user)
            .unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
        assert_eq!(ledger.current_stock(product).unwrap(), 10);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let (gateway, ledger) = gateway();
        let product = ProductId::new();
        let user = UserId::new();
        ledger.initialize(product, 10, user).unwrap();

        let err = gateway
            .adjust(product, -1, AdjustmentType::Increase, "typo", user)
            .unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
    }

    #[test]
    fn increase_and_decrease_map_to_signed_deltas() {
        let (gateway, ledger) = gateway();
        let product = ProductId::new();
        let user = UserId::new();
        ledger.initialize(product, 10, user).unwrap();

        let up = gateway
            .adjust(product, 4, AdjustmentType::Increase, "found pallet", user)
            .unwrap();
        assert_eq!(up.quantity_delta, 4);
        assert_eq!(up.movement_type, MovementType::Adjustment);

        let down = gateway
            .adjust(product, 6, AdjustmentType::Decrease, "damaged goods", user)
            .unwrap();
        assert_eq!(down.quantity_delta, -6);
        assert_eq!(ledger.current_stock(product).unwrap(), 8);
    }

    #[test]
    fn set_records_the_difference_to_the_target() {
        let (gateway, ledger) = gateway();
        let product = ProductId::new();
        let user = UserId::new();
        ledger.initialize(product, 820, user).unwrap();

        let m = gateway
            .adjust(product, 900, AdjustmentType::Set, "recount", user)
            .unwrap();
        assert_eq!(m.quantity_delta, 80);
        assert_eq!(m.new_stock, 900);
        assert_eq!(ledger.current_stock(product).unwrap(), 900);
    }

    #[test]
    fn decrease_below_zero_is_rejected_not_clamped() {
        let (gateway, ledger) = gateway();
        let product = ProductId::new();
        let user = UserId::new();
        ledger.initialize(product, 3, user).unwrap();

        let err = gateway
            .adjust(product, 5, AdjustmentType::Decrease, "shrinkage", user)
            .unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { .. }));
        assert_eq!(ledger.current_stock(product).unwrap(), 3);
    }
}
