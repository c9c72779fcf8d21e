//! Order Fulfillment Engine
//!
//! The fulfillment engine tracks a physical-goods order from payment through production, shipping and delivery. It is
//! the domain core of the order fulfillment gateway and contains no HTTP concerns.
//!
//! The library is divided into four main sections:
//! 1. The pure fulfillment logic: the [`mod@state_machine`] (the canonical status vocabulary, the transition graph and
//!    the side effects each transition implies), the [`mod@normalizer`] (translation of payment-processor and vendor
//!    webhook vocabularies into canonical events) and the [`mod@guard`] (duplicate / superseded event detection).
//!    These modules perform no I/O and can be tested in isolation.
//! 2. Database management and control ([`mod@sqlite`]). You should never need to access the database directly.
//!    Instead, use the public API of the engine. The exception is the data types used in the database, which are
//!    defined in the [`mod@db_types`] module and are public.
//! 3. The engine public API ([`FulfillmentApi`]). Every status change, regardless of origin (payment processor,
//!    vendor, or admin), flows through this single code path: normalize → guard → state machine → ledger → side
//!    effects.
//! 4. A set of events that can be subscribed to ([`mod@events`]). Side effects of a transition (customer
//!    notifications, review requests, discrepancy flags) are published as events and handled outside the transaction
//!    that commits the transition.

pub mod db_types;
pub mod events;
pub mod guard;
pub mod normalizer;
pub mod state_machine;
pub mod traits;

mod api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use api::{
    order_objects::{OrderWithHistory, TransitionOutcome},
    FulfillmentApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{FulfillmentDatabase, FulfillmentError, OrderManagement, OrderReadError};
