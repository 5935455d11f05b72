use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use stockward_core::ProductId;

/// Catalog product as seen by this engine (read-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Reorder threshold used by the alert engine.
    pub min_stock_level: i64,
    pub lead_time_days: u32,
    /// Price in smallest currency unit (e.g., cents) per kilogram.
    pub price_per_kg: u64,
}

/// Read-only view over the product catalog.
pub trait ProductCatalog: Send + Sync {
    fn get(&self, product_id: ProductId) -> Option<Product>;
    fn list(&self) -> Vec<Product>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn get(&self, product_id: ProductId) -> Option<Product> {
        (**self).get(product_id)
    }

    fn list(&self) -> Vec<Product> {
        (**self).list()
    }
}

/// In-memory catalog. Intended for tests/dev; production wires a real
/// catalog service behind the same trait.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product. This is the catalog owner's side of the boundary,
    /// exposed here so tests and dev setups can populate the view.
    pub fn insert(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id, product);
        }
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get(&self, product_id: ProductId) -> Option<Product> {
        self.products
            .read()
            .ok()
            .and_then(|p| p.get(&product_id).cloned())
    }

    fn list(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self
            .products
            .read()
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by_key(|p| p.id);
        all
    }
}
