use axum::routing::{get, post};
use axum::Router;

pub mod orders;
pub mod stock;
pub mod system;

/// Router for all identity-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/stock", get(stock::list_stock))
        .nest("/stock", stock::router())
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .nest("/orders", orders::router())
}
