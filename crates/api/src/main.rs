use std::sync::Arc;

use anyhow::Context;

use stockward_catalog::InMemoryProductCatalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockward_observability::init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    // Catalog contents are owned by the product service; an empty view is
    // a valid (if quiet) deployment.
    let catalog = Arc::new(InMemoryProductCatalog::new());

    let app = stockward_api::app::build_app(catalog);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
