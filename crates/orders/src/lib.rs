//! `stockward-orders` — order lifecycle and its coupling to the stock ledger.
//!
//! Orders reserve stock at creation (one `sale_out` per line, all or
//! nothing) and release it through compensating `return` movements when
//! cancelled. Status changes walk a directed, no-reverse-edge state graph.

pub mod fulfillment;
pub mod order;
pub mod store;

pub use fulfillment::FulfillmentService;
pub use order::{Order, OrderLine, OrderStatus, StatusChange};
pub use store::{InMemoryOrderStore, OrderStore};
