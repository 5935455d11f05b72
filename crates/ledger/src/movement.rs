use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockward_core::{MovementId, OrderId, ProductId, PurchaseId, UserId};

/// Kind of ledger entry.
///
/// Sign convention (enforced at append time): `initial`, `purchase_in` and
/// `return` carry non-negative deltas; `sale_out` carries non-positive
/// deltas; `adjustment` may be either sign.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Initial,
    PurchaseIn,
    SaleOut,
    Adjustment,
    Return,
}

impl MovementType {
    /// Whether `delta` respects this type's sign convention.
    pub fn allows_delta(self, delta: i64) -> bool {
        match self {
            MovementType::Initial | MovementType::PurchaseIn | MovementType::Return => delta >= 0,
            MovementType::SaleOut => delta <= 0,
            MovementType::Adjustment => true,
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            MovementType::Initial => "initial",
            MovementType::PurchaseIn => "purchase_in",
            MovementType::SaleOut => "sale_out",
            MovementType::Adjustment => "adjustment",
            MovementType::Return => "return",
        };
        f.write_str(s)
    }
}

/// Typed reference linking a movement back to the operation that caused it.
///
/// Also serves as the idempotency key: at most one `sale_out` (and one
/// `return`) movement exists per `(order, product)` pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MovementReference {
    None,
    Order(OrderId),
    Purchase(PurchaseId),
}

/// One immutable ledger entry recording a signed quantity change.
///
/// Never updated or deleted once committed. `previous_stock` and `new_stock`
/// snapshot the projection around the change so the chain is auditable
/// without replaying from the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity_delta: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reference: MovementReference,
    pub notes: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Local arithmetic invariant: `previous + delta == new` and `new >= 0`.
    pub fn is_arithmetically_sound(&self) -> bool {
        self.previous_stock + self.quantity_delta == self.new_stock && self.new_stock >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_convention_per_movement_type() {
        assert!(MovementType::Initial.allows_delta(0));
        assert!(MovementType::Initial.allows_delta(10));
        assert!(!MovementType::Initial.allows_delta(-1));

        assert!(MovementType::PurchaseIn.allows_delta(5));
        assert!(!MovementType::PurchaseIn.allows_delta(-5));

        assert!(MovementType::SaleOut.allows_delta(-3));
        assert!(!MovementType::SaleOut.allows_delta(3));

        assert!(MovementType::Return.allows_delta(3));
        assert!(!MovementType::Return.allows_delta(-3));

        assert!(MovementType::Adjustment.allows_delta(7));
        assert!(MovementType::Adjustment.allows_delta(-7));
    }

    #[test]
    fn movement_type_wire_form_is_snake_case() {
        let json = serde_json::to_string(&MovementType::PurchaseIn).unwrap();
        assert_eq!(json, "\"purchase_in\"");
        let json = serde_json::to_string(&MovementType::SaleOut).unwrap();
        assert_eq!(json, "\"sale_out\"");
    }

    #[test]
    fn arithmetic_soundness() {
        let m = Movement {
            id: MovementId::new(),
            product_id: ProductId::new(),
            movement_type: MovementType::PurchaseIn,
            quantity_delta: 5,
            previous_stock: 10,
            new_stock: 15,
            reference: MovementReference::None,
            notes: String::new(),
            user_id: UserId::new(),
            created_at: Utc::now(),
        };
        assert!(m.is_arithmetically_sound());

        let broken = Movement {
            new_stock: 14,
            ..m.clone()
        };
        assert!(!broken.is_arithmetically_sound());
    }
}
