use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ofg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The closed set of canonical order states. The legal moves between them are defined once, as data, in
/// [`crate::state_machine::next_states`]; nothing outside the state machine module may decide whether a transition
/// is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// Checkout has started but payment has not been confirmed.
    PendingPayment,
    /// Payment has been confirmed and the order has been assigned its reference number.
    Confirmation,
    /// The vendor is producing the goods.
    Production,
    /// Production is paused. Re-entrant: the order resumes to `Production` without losing its place.
    OnHold,
    /// The parcel has been handed to the carrier.
    Shipped,
    /// The carrier reports the parcel is out for delivery.
    OnTheWay,
    /// Terminal. The parcel has been delivered.
    Delivered,
    /// The goods are ready for collection at the pickup point.
    ReadyForPickup,
    /// Terminal. The customer has collected the goods.
    PickedUp,
    /// Terminal. Payment was declined before the order was ever confirmed.
    PaymentDeclined,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::PendingPayment => "PENDING_PAYMENT",
            OrderStatusType::Confirmation => "CONFIRMATION",
            OrderStatusType::Production => "PRODUCTION",
            OrderStatusType::OnHold => "ON_HOLD",
            OrderStatusType::Shipped => "SHIPPED",
            OrderStatusType::OnTheWay => "ON_THE_WAY",
            OrderStatusType::Delivered => "DELIVERED",
            OrderStatusType::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatusType::PickedUp => "PICKED_UP",
            OrderStatusType::PaymentDeclined => "PAYMENT_DECLINED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "CONFIRMATION" => Ok(Self::Confirmation),
            "PRODUCTION" => Ok(Self::Production),
            "ON_HOLD" => Ok(Self::OnHold),
            "SHIPPED" => Ok(Self::Shipped),
            "ON_THE_WAY" => Ok(Self::OnTheWay),
            "DELIVERED" => Ok(Self::Delivered),
            "READY_FOR_PICKUP" => Ok(Self::ReadyForPickup),
            "PICKED_UP" => Ok(Self::PickedUp),
            "PAYMENT_DECLINED" => Ok(Self::PaymentDeclined),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------   FulfillmentEvent    -------------------------------------------------------
/// The canonical event vocabulary. External notifications (payment processor, vendors) are translated into exactly
/// one of these by the [`crate::normalizer`]; each event targets exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentEvent {
    PaymentConfirmed,
    PaymentFailed,
    ProductionStarted,
    PlacedOnHold,
    Resumed,
    Shipped,
    OutForDelivery,
    Delivered,
    ReadyForPickup,
    PickedUp,
}

impl Display for FulfillmentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FulfillmentEvent::PaymentConfirmed => "PAYMENT_CONFIRMED",
            FulfillmentEvent::PaymentFailed => "PAYMENT_FAILED",
            FulfillmentEvent::ProductionStarted => "PRODUCTION_STARTED",
            FulfillmentEvent::PlacedOnHold => "PLACED_ON_HOLD",
            FulfillmentEvent::Resumed => "RESUMED",
            FulfillmentEvent::Shipped => "SHIPPED",
            FulfillmentEvent::OutForDelivery => "OUT_FOR_DELIVERY",
            FulfillmentEvent::Delivered => "DELIVERED",
            FulfillmentEvent::ReadyForPickup => "READY_FOR_PICKUP",
            FulfillmentEvent::PickedUp => "PICKED_UP",
        };
        f.write_str(s)
    }
}

//--------------------------------------      OrderNumber      -------------------------------------------------------
/// The human-facing order number, assigned by the storefront at checkout. Immutable once assigned, and the
/// correlation id for every external notification about the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Order          -------------------------------------------------------
/// The current-state projection of one customer purchase. `status` is a cache: it must always equal the `to_status`
/// of the most recent [`StatusHistoryEntry`] for the order, and is only ever written in the same transaction that
/// appends that entry.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    /// Internal id. Opaque and immutable.
    pub id: i64,
    pub order_number: OrderNumber,
    /// The customer id as assigned by the storefront.
    pub customer_id: String,
    /// Assigned exactly once, the first time the order reaches `Confirmation`. Never reassigned.
    pub reference_number: Option<String>,
    pub total: Money,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: OrderStatusType,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order number as assigned by the storefront
    pub order_number: OrderNumber,
    /// The customer id as assigned by the storefront
    pub customer_id: String,
    /// The total price of the order, in cents
    pub total: Money,
    /// The currency of the order
    pub currency: String,
    /// The time checkout began on the storefront
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<N: Into<OrderNumber>>(order_number: N, customer_id: String, total: Money) -> Self {
        Self {
            order_number: order_number.into(),
            customer_id,
            total,
            currency: "USD".to_string(),
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------  StatusHistoryEntry   -------------------------------------------------------
/// One immutable record in the order ledger. Created exactly once per accepted transition; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    /// Internal id of the order this entry belongs to.
    pub order_id: i64,
    pub from_status: OrderStatusType,
    pub to_status: OrderStatusType,
    /// Free-text notes. Carries vendor messages, admin reasons, and discrepancy annotations.
    pub notes: Option<String>,
    /// A human admin id, or the string identifying the automated source (e.g. "payment-processor" or a vendor id).
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     ReviewRequest     -------------------------------------------------------
/// A deferred "ask the customer for a review" record, created in the same transaction that commits the `Delivered`
/// transition and delivered later by a background worker.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub id: i64,
    pub order_id: i64,
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub due_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
