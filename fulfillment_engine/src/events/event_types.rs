use ofg_common::Money;

use crate::{
    db_types::{Order, ReviewRequest, StatusHistoryEntry},
    state_machine::SideEffects,
};

/// Fired after a transition has been committed to the ledger.
///
/// Carries the post-transition order, the ledger entry that was appended, and the side-effect flags the state
/// machine computed for the transition. Consumers that send customer notifications should check
/// `side_effects.notify_customer` rather than assuming every transition is announceable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransitionedEvent {
    pub order: Order,
    pub entry: StatusHistoryEntry,
    pub side_effects: SideEffects,
}

impl OrderTransitionedEvent {
    pub fn new(order: Order, entry: StatusHistoryEntry, side_effects: SideEffects) -> Self {
        Self { order, entry, side_effects }
    }
}

/// Fired when a confirmed payment's amount disagrees with the order total by more than the configured tolerance.
/// The transition has already been honored; this event exists so someone looks at the books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountDiscrepancyEvent {
    pub order: Order,
    pub expected: Money,
    pub actual: Money,
    pub processor_payment_id: String,
}

/// Fired by the review worker when a scheduled review request comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequestDueEvent {
    pub request: ReviewRequest,
}

impl ReviewRequestDueEvent {
    pub fn new(request: ReviewRequest) -> Self {
        Self { request }
    }
}
