use serde::Deserialize;

use stockward_alerts::Alert;
use stockward_ledger::{AdjustmentType, Movement, MovementReference};
use stockward_orders::{Order, OrderStatus};

use crate::app::services::{StockLevel, StockSummary};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub quantity: i64,
    pub adjustment_type: AdjustmentType,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct InitializeStockRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub quantity: i64,
    /// Supplier purchase reference; generated when omitted.
    pub purchase_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub buyer: String,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub product_id: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn movement_to_json(m: &Movement) -> serde_json::Value {
    let reference = match m.reference {
        MovementReference::None => serde_json::Value::Null,
        MovementReference::Order(id) => serde_json::json!({
            "kind": "order",
            "id": id.to_string(),
        }),
        MovementReference::Purchase(id) => serde_json::json!({
            "kind": "purchase",
            "id": id.to_string(),
        }),
    };

    serde_json::json!({
        "id": m.id.to_string(),
        "product_id": m.product_id.to_string(),
        "type": m.movement_type.to_string(),
        "quantity_delta": m.quantity_delta,
        "previous_stock": m.previous_stock,
        "new_stock": m.new_stock,
        "reference": reference,
        "notes": m.notes,
        "user_id": m.user_id.to_string(),
        "created_at": m.created_at.to_rfc3339(),
    })
}

pub fn stock_level_to_json(level: &StockLevel) -> serde_json::Value {
    serde_json::json!({
        "product_id": level.projection.product_id.to_string(),
        "name": level.name,
        "quantity": level.projection.quantity,
        "last_updated": level.projection.last_updated.to_rfc3339(),
    })
}

pub fn summary_to_json(summary: &StockSummary) -> serde_json::Value {
    serde_json::json!({
        "product_count": summary.product_count,
        "total_quantity": summary.total_quantity,
        "low_stock_count": summary.low_stock_count,
    })
}

pub fn alert_to_json(alert: &Alert) -> serde_json::Value {
    serde_json::json!({
        "product_id": alert.product_id.to_string(),
        "current_stock": alert.current_stock,
        "min_stock_level": alert.min_stock_level,
        "deficit": alert.deficit,
        "urgency": alert.urgency,
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id.to_string(),
        "buyer": order.buyer,
        "items": order.lines.iter().map(|l| serde_json::json!({
            "product_id": l.product_id.to_string(),
            "quantity": l.quantity,
        })).collect::<Vec<_>>(),
        "status": order.status,
        "created_at": order.created_at.to_rfc3339(),
        "status_history": order.status_history.iter().map(|c| serde_json::json!({
            "status": c.status,
            "changed_at": c.changed_at.to_rfc3339(),
            "changed_by": c.changed_by.to_string(),
        })).collect::<Vec<_>>(),
    })
}
