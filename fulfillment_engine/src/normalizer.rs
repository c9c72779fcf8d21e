//! Translation of external webhook vocabularies into canonical [`FulfillmentEvent`]s.
//!
//! External parties never speak the canonical vocabulary directly. The payment processor sends
//! `payment.created` / `payment.updated` events with its own status strings; each vendor reports fulfillment
//! progress in its own words. Everything is normalized here, in one place, so that adding a vendor never touches
//! the transition graph.
//!
//! Unrecognized vocabulary is rejected with a typed error, never guessed at.

use chrono::{DateTime, Utc};
use log::warn;
use ofg_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{FulfillmentEvent, OrderNumber};

/// The `changed_by` attribution recorded for processor-driven transitions.
pub const PAYMENT_PROCESSOR_SOURCE: &str = "payment-processor";

#[derive(Debug, Clone, Error)]
pub enum NormalizeError {
    #[error("Unsupported payment event type: {0}")]
    UnsupportedEventType(String),
    #[error("Unknown payment status: {0}")]
    UnknownPaymentStatus(String),
    #[error("Payment event carries no order reference")]
    MissingOrderReference,
    #[error("Vendor {vendor_id} reported unmapped status '{status}'")]
    UnmappedVendorStatus { vendor_id: String, status: String },
}

//--------------------------------------  Payment processor  ---------------------------------------------------------

/// The envelope the payment processor posts to the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    /// Event id assigned by the processor. Useful for log correlation; idempotency is enforced against the order
    /// ledger, not this id.
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEventData {
    pub object: PaymentEventObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEventObject {
    pub payment: PaymentData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentData {
    pub id: String,
    pub status: String,
    pub amount_money: AmountMoney,
    /// The caller-supplied correlation id: the order number the payment is for.
    #[serde(default)]
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountMoney {
    /// Amount in cents.
    pub amount: i64,
    pub currency: String,
}

/// A payment event reduced to what the fulfillment pipeline needs.
#[derive(Debug, Clone)]
pub struct PaymentNotification {
    pub order_number: OrderNumber,
    pub event: FulfillmentEvent,
    pub amount: Money,
    pub processor_payment_id: String,
}

/// Normalizes a payment-processor event.
///
/// `COMPLETED` maps to [`FulfillmentEvent::PaymentConfirmed`]; `FAILED` and `CANCELED` map to
/// [`FulfillmentEvent::PaymentFailed`]. Anything else is an error: a new processor status must be mapped here
/// deliberately, not absorbed silently.
pub fn normalize_payment_event(event: &PaymentWebhookEvent) -> Result<PaymentNotification, NormalizeError> {
    if !matches!(event.event_type.as_str(), "payment.created" | "payment.updated") {
        return Err(NormalizeError::UnsupportedEventType(event.event_type.clone()));
    }
    let payment = &event.data.object.payment;
    let canonical = match payment.status.as_str() {
        "COMPLETED" => FulfillmentEvent::PaymentConfirmed,
        "FAILED" | "CANCELED" => FulfillmentEvent::PaymentFailed,
        other => return Err(NormalizeError::UnknownPaymentStatus(other.to_string())),
    };
    let order_number = payment
        .reference_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(OrderNumber::from)
        .ok_or(NormalizeError::MissingOrderReference)?;
    Ok(PaymentNotification {
        order_number,
        event: canonical,
        amount: Money::from_cents(payment.amount_money.amount),
        processor_payment_id: payment.id.clone(),
    })
}

//--------------------------------------  Amount reconciliation  -----------------------------------------------------

/// The outcome of comparing the paid amount against the order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountCheck {
    Match,
    /// The amounts differ by more than the tolerance. The payment is still honored — rejecting a real payment is
    /// worse than flagging an accounting anomaly — but the discrepancy is surfaced for manual review.
    Discrepancy { expected: Money, actual: Money },
}

pub fn reconcile_amount(order_total: Money, paid: Money, tolerance: Money) -> AmountCheck {
    if order_total.within_tolerance(paid, tolerance) {
        AmountCheck::Match
    } else {
        warn!("💱️ Paid amount {paid} differs from order total {order_total} by more than {tolerance}.");
        AmountCheck::Discrepancy { expected: order_total, actual: paid }
    }
}

//--------------------------------------       Vendors       ---------------------------------------------------------

/// A vendor's fulfillment status notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorWebhookEvent {
    pub order_number: OrderNumber,
    pub vendor_id: String,
    /// Vendor-specific status string; translated through [`canonical_event_for_vendor_status`].
    pub status: String,
    #[serde(default)]
    pub details: Option<VendorEventDetails>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorEventDetails {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A vendor event reduced to what the fulfillment pipeline needs.
#[derive(Debug, Clone)]
pub struct VendorNotification {
    pub order_number: OrderNumber,
    pub vendor_id: String,
    pub event: FulfillmentEvent,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub message: Option<String>,
}

/// The vendor-vocabulary lookup table. Vendors are sloppy about casing and separators, so the match is done on a
/// lower-cased, underscore-normalized form.
pub fn canonical_event_for_vendor_status(status: &str) -> Option<FulfillmentEvent> {
    let normalized = status.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let event = match normalized.as_str() {
        "in_production" | "production_started" | "printing" => FulfillmentEvent::ProductionStarted,
        "on_hold" | "paused" => FulfillmentEvent::PlacedOnHold,
        "resumed" | "production_resumed" => FulfillmentEvent::Resumed,
        "shipped" | "dispatched" => FulfillmentEvent::Shipped,
        "out_for_delivery" | "in_transit" => FulfillmentEvent::OutForDelivery,
        "delivered" => FulfillmentEvent::Delivered,
        "ready_for_pickup" | "ready_for_collection" => FulfillmentEvent::ReadyForPickup,
        "picked_up" | "collected" => FulfillmentEvent::PickedUp,
        _ => return None,
    };
    Some(event)
}

pub fn normalize_vendor_event(event: &VendorWebhookEvent) -> Result<VendorNotification, NormalizeError> {
    let canonical =
        canonical_event_for_vendor_status(&event.status).ok_or_else(|| NormalizeError::UnmappedVendorStatus {
            vendor_id: event.vendor_id.clone(),
            status: event.status.clone(),
        })?;
    let details = event.details.clone().unwrap_or_default();
    Ok(VendorNotification {
        order_number: event.order_number.clone(),
        vendor_id: event.vendor_id.clone(),
        event: canonical,
        tracking_number: details.tracking_number,
        carrier: details.carrier,
        message: details.message,
    })
}
