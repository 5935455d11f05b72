use serde::{Deserialize, Serialize};

use stockward_catalog::ProductCatalog;
use stockward_core::ProductId;
use stockward_ledger::MovementStore;

/// Shortage severity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Warning,
    Critical,
}

/// Derived shortage record. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub product_id: ProductId,
    pub current_stock: i64,
    pub min_stock_level: i64,
    /// Shortfall between the minimum level and the current stock.
    pub deficit: i64,
    pub urgency: Urgency,
}

/// Compares projected quantities against per-product minimum thresholds.
#[derive(Debug)]
pub struct AlertEngine<M, C> {
    store: M,
    catalog: C,
}

impl<M, C> AlertEngine<M, C>
where
    M: MovementStore,
    C: ProductCatalog,
{
    pub fn new(store: M, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Classify one product, if it is short.
    ///
    /// A product without a projection counts as zero stock: a configured
    /// minimum with nothing on hand is exactly the situation to flag.
    pub fn classify(&self, product_id: ProductId, min_stock_level: i64) -> Option<Alert> {
        let current_stock = self
            .store
            .projection(product_id)
            .map(|p| p.quantity)
            .unwrap_or(0);

        let deficit = min_stock_level - current_stock;
        if deficit <= 0 {
            return None;
        }

        let urgency = if current_stock == 0 || current_stock <= min_stock_level / 2 {
            Urgency::Critical
        } else {
            Urgency::Warning
        };

        Some(Alert {
            product_id,
            current_stock,
            min_stock_level,
            deficit,
            urgency,
        })
    }

    /// Recompute all alerts from the catalog and the current projections.
    pub fn compute(&self) -> Vec<Alert> {
        self.catalog
            .list()
            .into_iter()
            .filter_map(|p| self.classify(p.id, p.min_stock_level))
            .collect()
    }
}
