use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use ofg_common::Money;

use crate::{
    api::order_objects::{OrderWithHistory, TransitionOutcome},
    db_types::{FulfillmentEvent, NewOrder, Order, OrderNumber, OrderStatusType},
    events::{AmountDiscrepancyEvent, EventProducers, OrderTransitionedEvent},
    guard::{classify_and_log, GuardDecision},
    normalizer::{
        self,
        AmountCheck,
        PaymentWebhookEvent,
        VendorWebhookEvent,
        PAYMENT_PROCESSOR_SOURCE,
    },
    state_machine::{transition, Transition},
    traits::{FulfillmentDatabase, FulfillmentError, TransitionContext},
};

/// How many times a transition is retried when it loses a write race before giving up.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// `FulfillmentApi` is the primary entry point for moving orders through their lifecycle in response to checkout,
/// payment-processor, vendor and admin events.
///
/// Every external event follows the same path: normalize to a canonical [`FulfillmentEvent`], classify against the
/// stored order (duplicate / stale / actionable), validate through the state machine, commit atomically, then fire
/// hooks. Only the normalization step differs per source.
pub struct FulfillmentApi<B> {
    db: B,
    producers: EventProducers,
    amount_tolerance: Money,
    review_request_delay: Duration,
}

impl<B> Debug for FulfillmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B> FulfillmentApi<B> {
    pub fn new(db: B, producers: EventProducers, amount_tolerance: Money, review_request_delay: Duration) -> Self {
        Self { db, producers, amount_tolerance, review_request_delay }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> FulfillmentApi<B>
where B: FulfillmentDatabase
{
    /// Registers a new order from a storefront checkout.
    ///
    /// The order starts life in `PENDING_PAYMENT` with its creation row already in the ledger. Resubmitting the
    /// same order number is harmless; the stored order is returned and `inserted` is false.
    pub async fn process_checkout(&self, order: NewOrder) -> Result<(Order, bool), FulfillmentError> {
        let (order, inserted) = self.db.insert_order(order).await?;
        if inserted {
            info!("🔄️🛒️ Order {} created for customer {} ({})", order.order_number, order.customer_id, order.total);
        } else {
            debug!("🔄️🛒️ Order {} was already registered. Ignoring the resubmission.", order.order_number);
        }
        Ok((order, inserted))
    }

    /// Runs a payment-processor webhook through the pipeline.
    ///
    /// A confirmed payment moves the order to `CONFIRMATION`; a failed or canceled one to `PAYMENT_DECLINED`. The
    /// paid amount is reconciled against the order total: a mismatch beyond the tolerance never blocks the
    /// transition, but it is recorded in the ledger notes and announced on the discrepancy hook.
    pub async fn process_payment_event(&self, event: &PaymentWebhookEvent) -> Result<TransitionOutcome, FulfillmentError> {
        let notification = normalizer::normalize_payment_event(event)?;
        let order = self.fetch_required(&notification.order_number).await?;
        trace!(
            "🔄️💰️ Payment event {} ({:?}) received for order {}",
            event.event_id,
            notification.event,
            order.order_number
        );
        let mut ctx = TransitionContext::new(PAYMENT_PROCESSOR_SOURCE);
        let mut discrepancy = None;
        if notification.event == FulfillmentEvent::PaymentConfirmed {
            ctx.reference_number = Some(notification.processor_payment_id.clone());
            if let AmountCheck::Discrepancy { expected, actual } =
                normalizer::reconcile_amount(order.total, notification.amount, self.amount_tolerance)
            {
                ctx.notes = Some(format!(
                    "Amount discrepancy: processor reported {actual}, order total is {expected} (payment {})",
                    notification.processor_payment_id
                ));
                discrepancy = Some((expected, actual));
            }
        }
        let outcome = self.apply_event(order, notification.event, ctx).await?;
        if let (TransitionOutcome::Applied { order, .. }, Some((expected, actual))) = (&outcome, discrepancy) {
            self.call_amount_discrepancy_hook(order, expected, actual, &notification.processor_payment_id).await;
        }
        Ok(outcome)
    }

    /// Runs a vendor fulfillment notification through the pipeline.
    ///
    /// The vendor's status string is translated via the vendor lookup table. Transitions that carry shipment data
    /// record the tracking number and carrier on the order projection.
    pub async fn process_vendor_event(&self, event: &VendorWebhookEvent) -> Result<TransitionOutcome, FulfillmentError> {
        let notification = normalizer::normalize_vendor_event(event)?;
        let order = self.fetch_required(&notification.order_number).await?;
        trace!(
            "🔄️🚚️ Vendor {} reported {:?} for order {}",
            notification.vendor_id,
            notification.event,
            order.order_number
        );
        let mut ctx = TransitionContext::new(notification.vendor_id.clone());
        ctx.notes = notification.message.clone();
        ctx.tracking_number = notification.tracking_number.clone();
        ctx.carrier = notification.carrier.clone();
        self.apply_event(order, notification.event, ctx).await
    }

    /// Forces an order to a target status on behalf of an administrator.
    ///
    /// The same graph rules apply as for external events; admins can only follow edges, not jump phases. Targets
    /// that no event leads to (`PENDING_PAYMENT`) are rejected outright.
    pub async fn admin_set_status(
        &self,
        order_number: &OrderNumber,
        target: OrderStatusType,
        admin_id: &str,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, FulfillmentError> {
        let event = FulfillmentEvent::for_target(target).ok_or_else(|| {
            FulfillmentError::UnsupportedAction(format!("No fulfillment event leads to {target}"))
        })?;
        let order = self.fetch_required(order_number).await?;
        info!("🔄️🪛️ Admin {admin_id} is moving order {order_number} from {} to {target}", order.status);
        let mut ctx = TransitionContext::new(admin_id);
        ctx.notes = reason;
        if event == FulfillmentEvent::PaymentConfirmed {
            // A manual confirmation has no processor payment id, but the order must still get its reference
            // number the first time it reaches CONFIRMATION. Derive a stable one from the order itself.
            ctx.reference_number = Some(format!("manual-{}", order_number.as_str()));
        }
        self.apply_event(order, event, ctx).await
    }

    /// Fetches an order along with its complete status ledger.
    pub async fn order_with_history(&self, order_number: &OrderNumber) -> Result<OrderWithHistory, FulfillmentError> {
        let order = self.fetch_required(order_number).await?;
        let history = self.db.history_for_order(order_number).await?;
        Ok(OrderWithHistory::new(order, history))
    }

    /// The shared event path: guard, validate, resolve side-effect payloads, commit, fire hooks.
    ///
    /// A lost write race is retried against the re-read order. The re-read goes back through the guard, so an event
    /// that was actionable a moment ago but has since been applied by a rival request settles as
    /// [`TransitionOutcome::AlreadyApplied`] instead of an error.
    async fn apply_event(
        &self,
        mut order: Order,
        event: FulfillmentEvent,
        mut ctx: TransitionContext,
    ) -> Result<TransitionOutcome, FulfillmentError> {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            match classify_and_log(&order.order_number, order.status, event) {
                GuardDecision::Duplicate => return Ok(TransitionOutcome::AlreadyApplied { order }),
                GuardDecision::Proceed => {},
            }
            let transition = transition(order.status, event)?;
            ctx.review_request_due = transition
                .side_effects
                .schedule_review_request
                .then(|| Utc::now() + self.review_request_delay);
            match self.db.apply_transition(&order, &transition, &ctx).await {
                Ok((updated, entry)) => {
                    info!(
                        "🔄️📦️ Order {} moved from {} to {} by {}",
                        updated.order_number, transition.from, transition.to, ctx.changed_by
                    );
                    self.call_order_transitioned_hook(&updated, &entry, &transition).await;
                    return Ok(TransitionOutcome::Applied { order: updated, entry });
                },
                Err(FulfillmentError::ConcurrentUpdate) if attempt < MAX_TRANSITION_ATTEMPTS => {
                    debug!(
                        "🔄️📦️ Order {} changed under us (attempt {attempt}). Re-reading and retrying.",
                        order.order_number
                    );
                    order = self.fetch_required(&order.order_number).await?;
                },
                Err(e) => return Err(e),
            }
        }
        Err(FulfillmentError::ConcurrentUpdate)
    }

    async fn fetch_required(&self, order_number: &OrderNumber) -> Result<Order, FulfillmentError> {
        self.db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_number.clone()))
    }

    async fn call_order_transitioned_hook(
        &self,
        order: &Order,
        entry: &crate::db_types::StatusHistoryEntry,
        transition: &Transition,
    ) {
        for emitter in &self.producers.order_transitioned_producer {
            trace!("🔄️📦️ Notifying order transition hook subscribers");
            let event = OrderTransitionedEvent::new(order.clone(), entry.clone(), transition.side_effects);
            emitter.publish_event(event).await;
        }
    }

    async fn call_amount_discrepancy_hook(&self, order: &Order, expected: Money, actual: Money, payment_id: &str) {
        for emitter in &self.producers.amount_discrepancy_producer {
            warn!("🔄️💱️ Notifying discrepancy hook subscribers for order {}", order.order_number);
            let event = AmountDiscrepancyEvent {
                order: order.clone(),
                expected,
                actual,
                processor_payment_id: payment_id.to_string(),
            };
            emitter.publish_event(event).await;
        }
    }
}
