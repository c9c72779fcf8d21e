//! The pure order fulfillment state machine.
//!
//! The transition graph is defined once, as data ([`next_states`]); [`can_transition_to`] is a membership check
//! against it and [`transition`] computes the next state for a canonical event or rejects it with a typed
//! [`InvalidTransitionError`]. The machine performs no I/O and never mutates anything: side effects of a transition
//! are *reported* as [`SideEffects`] flags and executed elsewhere.
//!
//! The graph:
//!
//! ```text
//! PENDING_PAYMENT ──> CONFIRMATION ──> PRODUCTION ──> SHIPPED ──> ON_THE_WAY ──> DELIVERED
//!        │                             ╱│    ▲╲
//!        v                            ╱ v    │ ╲──> READY_FOR_PICKUP ──> PICKED_UP
//! PAYMENT_DECLINED                   ╱ ON_HOLD ─╯
//! ```
//!
//! `ON_HOLD` is re-entrant: an in-production order may be placed on hold and later resumed without losing its place.

use thiserror::Error;

use crate::db_types::{FulfillmentEvent, OrderStatusType};

/// The set of states the given state may legally move to. This is the single source of truth for the transition
/// graph; every other check in the engine derives from it.
pub const fn next_states(from: OrderStatusType) -> &'static [OrderStatusType] {
    use OrderStatusType::*;
    match from {
        PendingPayment => &[Confirmation, PaymentDeclined],
        Confirmation => &[Production],
        Production => &[OnHold, Shipped, ReadyForPickup],
        OnHold => &[Production],
        Shipped => &[OnTheWay],
        OnTheWay => &[Delivered],
        ReadyForPickup => &[PickedUp],
        Delivered | PickedUp | PaymentDeclined => &[],
    }
}

/// Pure membership check against the transition graph.
pub fn can_transition_to(from: OrderStatusType, to: OrderStatusType) -> bool {
    next_states(from).contains(&to)
}

impl OrderStatusType {
    /// How far along the fulfillment progression this state is. States at the same phase are alternatives (hold vs.
    /// production, shipping vs. pickup branch), never predecessors of one another. The idempotency guard uses the
    /// phase to tell "this event was already applied or superseded" from "this event genuinely conflicts".
    pub fn phase(self) -> u8 {
        use OrderStatusType::*;
        match self {
            PendingPayment => 0,
            Confirmation | PaymentDeclined => 1,
            Production | OnHold => 2,
            Shipped | ReadyForPickup => 3,
            OnTheWay => 4,
            Delivered | PickedUp => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        next_states(self).is_empty()
    }
}

impl FulfillmentEvent {
    /// Each canonical event maps to exactly one target state.
    pub fn target_status(self) -> OrderStatusType {
        use FulfillmentEvent::*;
        match self {
            PaymentConfirmed => OrderStatusType::Confirmation,
            PaymentFailed => OrderStatusType::PaymentDeclined,
            ProductionStarted => OrderStatusType::Production,
            PlacedOnHold => OrderStatusType::OnHold,
            Resumed => OrderStatusType::Production,
            Shipped => OrderStatusType::Shipped,
            OutForDelivery => OrderStatusType::OnTheWay,
            Delivered => OrderStatusType::Delivered,
            ReadyForPickup => OrderStatusType::ReadyForPickup,
            PickedUp => OrderStatusType::PickedUp,
        }
    }

    /// The canonical event an explicit admin "move this order to X" request maps onto, so that admin-initiated
    /// transitions go through the same machine as webhook-driven ones. `PendingPayment` is the initial state and is
    /// not the target of any event.
    pub fn for_target(status: OrderStatusType) -> Option<FulfillmentEvent> {
        use OrderStatusType::*;
        let event = match status {
            PendingPayment => return None,
            Confirmation => FulfillmentEvent::PaymentConfirmed,
            PaymentDeclined => FulfillmentEvent::PaymentFailed,
            Production => FulfillmentEvent::ProductionStarted,
            OnHold => FulfillmentEvent::PlacedOnHold,
            Shipped => FulfillmentEvent::Shipped,
            OnTheWay => FulfillmentEvent::OutForDelivery,
            Delivered => FulfillmentEvent::Delivered,
            ReadyForPickup => FulfillmentEvent::ReadyForPickup,
            PickedUp => FulfillmentEvent::PickedUp,
        };
        Some(event)
    }
}

//--------------------------------------      SideEffects      -------------------------------------------------------
/// What must happen as a consequence of an accepted transition. The machine only reports these; the ledger applies
/// the field updates transactionally and the event dispatcher handles the rest asynchronously.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideEffects {
    /// The customer should be told about this status change.
    pub notify_customer: bool,
    /// The order reference number must be assigned now (first arrival in `Confirmation`).
    pub assign_reference_number: bool,
    /// `paid_at` must be recorded now.
    pub record_paid_at: bool,
    /// Tracking number and carrier reported by the vendor must be recorded now.
    pub record_tracking: bool,
    /// A deferred review request must be scheduled now (arrival in `Delivered`).
    pub schedule_review_request: bool,
}

fn side_effects_for(event: FulfillmentEvent) -> SideEffects {
    use FulfillmentEvent::*;
    match event {
        PaymentConfirmed => SideEffects {
            notify_customer: true,
            assign_reference_number: true,
            record_paid_at: true,
            ..SideEffects::default()
        },
        PaymentFailed => SideEffects { notify_customer: true, ..SideEffects::default() },
        Shipped => SideEffects { notify_customer: true, record_tracking: true, ..SideEffects::default() },
        OutForDelivery | ReadyForPickup => SideEffects { notify_customer: true, ..SideEffects::default() },
        Delivered => SideEffects { notify_customer: true, schedule_review_request: true, ..SideEffects::default() },
        ProductionStarted | PlacedOnHold | Resumed | PickedUp => SideEffects::default(),
    }
}

//--------------------------------------       Transition      -------------------------------------------------------
/// An accepted transition, ready to be applied to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub event: FulfillmentEvent,
    pub side_effects: SideEffects,
}

/// A transition the graph does not allow. This is a rejection, not a crash: callers (webhook handlers, the admin
/// endpoint) decide how to surface it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot move order from {from} to {to}: {reason}")]
pub struct InvalidTransitionError {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub reason: String,
}

/// Computes the transition the event implies for an order currently in `current`, or rejects it.
///
/// There is no skip-ahead: an event whose target state has no edge from `current` is rejected, even if the target
/// lies further along the fulfillment progression. A vendor reporting `DELIVERED` for an order still in
/// `PENDING_PAYMENT` is a conflict, not a shortcut.
pub fn transition(
    current: OrderStatusType,
    event: FulfillmentEvent,
) -> Result<Transition, InvalidTransitionError> {
    let to = event.target_status();
    if !can_transition_to(current, to) {
        let reason = if current.is_terminal() {
            format!("{current} is a terminal state")
        } else {
            format!("the transition graph has no edge from {current} to {to}")
        };
        return Err(InvalidTransitionError { from: current, to, reason });
    }
    Ok(Transition { from: current, to, event, side_effects: side_effects_for(event) })
}
