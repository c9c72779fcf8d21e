//! The idempotency / reconciliation guard.
//!
//! Webhook transports deliver at least once: the same notification can arrive twice, and notifications can arrive
//! out of order. Before the state machine runs, the guard compares the order's *current persisted* status against
//! the event's target and decides whether the event still means anything.
//!
//! The two failure modes matter to operators and must stay distinguishable in logs: a benign duplicate is a
//! successful no-op, a genuine conflict is a rejection.

use log::{debug, warn};

use crate::{
    db_types::{FulfillmentEvent, OrderNumber, OrderStatusType},
    state_machine::can_transition_to,
};

/// What to do with an inbound canonical event, given the order's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The event is actionable (or genuinely conflicting — the state machine will decide). Run the machine.
    Proceed,
    /// The event was already applied, or a later event superseded it. Succeed without touching the ledger and
    /// without firing side effects.
    Duplicate,
}

/// Classifies an event against the order's current status.
///
/// An event is a duplicate when the order already sits in the event's target state, or when the order has moved to a
/// later phase than the target (an earlier delivery of this or a superseding event already won). The hold loop is
/// the one place phases tie: `PLACED_ON_HOLD` against a `PRODUCTION` order and `RESUMED` against an `ON_HOLD` order
/// are real transitions, and the edge check catches them before the phase comparison matters.
pub fn classify(current: OrderStatusType, event: FulfillmentEvent) -> GuardDecision {
    let target = event.target_status();
    if can_transition_to(current, target) {
        return GuardDecision::Proceed;
    }
    if current == target || current.phase() > target.phase() {
        return GuardDecision::Duplicate;
    }
    GuardDecision::Proceed
}

/// [`classify`] with the operator-facing log lines attached. The order number is only used for logging.
pub fn classify_and_log(
    order_number: &OrderNumber,
    current: OrderStatusType,
    event: FulfillmentEvent,
) -> GuardDecision {
    let decision = classify(current, event);
    match decision {
        GuardDecision::Duplicate => {
            debug!("🛡️ {event} for order {order_number} is a duplicate or superseded event (order is {current}). No-op.");
        },
        GuardDecision::Proceed if !can_transition_to(current, event.target_status()) => {
            warn!(
                "🛡️ {event} for order {order_number} conflicts with its current status {current}. This is not a \
                 duplicate; the transition will be rejected."
            );
        },
        GuardDecision::Proceed => {},
    }
    decision
}
