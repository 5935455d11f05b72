use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use stockward_core::{ProductId, PurchaseId};
use stockward_ledger::MovementCursor;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestIdentity;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

pub fn router() -> Router {
    Router::new()
        .route("/summary", get(summary))
        .route("/alerts", get(alerts))
        .route("/movements", get(movements))
        .route("/audit", get(audit))
        .route("/:id", put(adjust_stock))
        .route("/:id/initial", post(initialize_stock))
        .route("/:id/receive", post(receive_stock))
}

pub async fn list_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let levels: Vec<_> = services
        .stock_levels()
        .iter()
        .map(dto::stock_level_to_json)
        .collect();
    (StatusCode::OK, Json(serde_json::json!({ "stock": levels }))).into_response()
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    (StatusCode::OK, Json(dto::summary_to_json(&services.summary()))).into_response()
}

pub async fn alerts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let alerts: Vec<_> = services.alerts().iter().map(dto::alert_to_json).collect();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "count": alerts.len(),
            "alerts": alerts,
        })),
    )
        .into_response()
}

pub async fn movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementsQuery>,
) -> axum::response::Response {
    let product_id = match query.product_id.as_deref() {
        Some(raw) => match raw.parse::<ProductId>() {
            Ok(id) => Some(id),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
            }
        },
        None => None,
    };
    let cursor = match query.cursor.as_deref() {
        Some(raw) => match raw.parse::<MovementCursor>() {
            Ok(c) => Some(c),
            Err(e) => return errors::stock_error_to_response(e),
        },
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let page = services.movements(product_id, limit, cursor);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "movements": page.movements.iter().map(dto::movement_to_json).collect::<Vec<_>>(),
            "next_cursor": page.next_cursor.map(|c| c.to_string()),
        })),
    )
        .into_response()
}

pub async fn audit(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let violations: Vec<_> = services
        .audit()
        .into_iter()
        .map(|(product_id, err)| {
            serde_json::json!({
                "product_id": product_id.to_string(),
                "error": err.to_string(),
            })
        })
        .collect();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "consistent": violations.is_empty(),
            "violations": violations,
        })),
    )
        .into_response()
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.adjust(
        product_id,
        body.quantity,
        body.adjustment_type,
        body.notes,
        identity.user_id(),
    ) {
        Ok(movement) => (StatusCode::OK, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn initialize_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    Json(body): Json<dto::InitializeStockRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.initialize(product_id, body.quantity, identity.user_id()) {
        Ok(movement) => (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn receive_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    let purchase_id = match body.purchase_id.as_deref() {
        Some(raw) => match raw.parse::<PurchaseId>() {
            Ok(v) => v,
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid purchase id")
            }
        },
        None => PurchaseId::new(),
    };

    match services.receive(
        product_id,
        body.quantity,
        purchase_id,
        body.notes.unwrap_or_else(|| "purchase received".to_string()),
        identity.user_id(),
    ) {
        Ok(movement) => (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
