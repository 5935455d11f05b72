use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use stockward_core::{OrderId, ProductId};
use stockward_orders::OrderLine;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestIdentity;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_status))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let mut lines = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let product_id: ProductId = match item.product_id.parse() {
            Ok(v) => v,
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
            }
        };
        lines.push(OrderLine {
            product_id,
            quantity: item.quantity,
        });
    }

    match services.create_order(body.buyer, lines, identity.user_id()) {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let orders: Vec<_> = services.list_orders().iter().map(dto::order_to_json).collect();
    (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response()
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.get_order(order_id) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.update_order_status(order_id, body.status, identity.user_id()) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
