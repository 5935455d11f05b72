//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: component wiring (stores, ledger, gateway, fulfillment)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use stockward_catalog::InMemoryProductCatalog;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// The catalog is this engine's read-only view of the product service;
/// the caller owns seeding it.
pub fn build_app(catalog: Arc<InMemoryProductCatalog>) -> Router {
    let services = Arc::new(services::AppServices::new(catalog));

    // Identity-scoped routes: every write is attributed to a user.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
