use thiserror::Error;

use crate::db_types::{Order, OrderNumber, StatusHistoryEntry};

#[derive(Debug, Clone, Error)]
pub enum OrderReadError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<sqlx::Error> for OrderReadError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Read-only queries over orders and their status ledgers.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given order number, or `None` if it does not exist.
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderReadError>;

    /// Returns the full status ledger for the order, oldest entry first. The entries include the creation row, so
    /// the result is never empty for an existing order.
    async fn history_for_order(&self, order_number: &OrderNumber) -> Result<Vec<StatusHistoryEntry>, OrderReadError>;

    /// Returns all orders belonging to the given customer, newest first.
    async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderReadError>;
}
