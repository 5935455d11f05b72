//! `stockward-api` — HTTP surface over the stock ledger and order
//! fulfillment engine.

pub mod app;
pub mod context;
pub mod middleware;
