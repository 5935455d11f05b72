//! `stockward-catalog` — read-only product catalog boundary.
//!
//! The catalog is an external collaborator: this engine never edits product
//! names, prices or thresholds. It only reads `min_stock_level` (alerting)
//! and product identity (joins on the stock views).

pub mod product;

pub use product::{InMemoryProductCatalog, Product, ProductCatalog};
