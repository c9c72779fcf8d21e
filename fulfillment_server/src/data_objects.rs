use std::fmt::Display;

use fulfillment_engine::db_types::OrderStatusType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of a `POST /api/orders/{order_number}/status` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStatusUpdate {
    pub status: OrderStatusType,
    /// Who is making the change. Recorded in the order ledger.
    pub updated_by: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Checkout payload posted by the storefront when a customer completes a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPayload {
    pub order_number: String,
    pub customer_id: String,
    /// Order total in cents.
    pub total: i64,
    #[serde(default)]
    pub currency: Option<String>,
}
