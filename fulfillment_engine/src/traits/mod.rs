//! Interface contracts for fulfillment database backends.
//!
//! Two traits split the storage surface by intent:
//!
//! * [`FulfillmentDatabase`] is the write side. It owns order creation, the transactional
//!   transition commit, and the review-request schedule.
//! * [`OrderManagement`] is the read side: fetching orders, their ledgers, and customer order lists.
//!
//! The sqlite backend implements both; the server and the API layer only ever talk to these traits.

mod fulfillment_database;
mod order_management;

pub use fulfillment_database::{FulfillmentDatabase, FulfillmentError, TransitionContext};
pub use order_management::{OrderManagement, OrderReadError};
