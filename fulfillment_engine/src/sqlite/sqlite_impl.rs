//! `SqliteDatabase` is the concrete SQLite implementation of the fulfillment engine backend traits.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, history, new_pool, orders, reviews};
use crate::{
    db_types::{NewOrder, Order, OrderNumber, ReviewRequest, StatusHistoryEntry},
    state_machine::Transition,
    traits::{
        FulfillmentDatabase,
        FulfillmentError,
        OrderManagement,
        OrderReadError,
        TransitionContext,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderReadError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn history_for_order(&self, order_number: &OrderNumber) -> Result<Vec<StatusHistoryEntry>, OrderReadError> {
        let mut conn = self.pool.acquire().await?;
        if orders::fetch_order_by_number(order_number, &mut conn).await?.is_none() {
            return Err(OrderReadError::OrderNotFound(order_number.clone()));
        }
        let entries = history::history_for_order(order_number, &mut conn).await?;
        Ok(entries)
    }

    async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderReadError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_customer(customer_id, &mut conn).await?;
        Ok(orders)
    }
}

impl FulfillmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let (order, inserted) = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        if inserted {
            debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_number, order.id);
        }
        Ok((order, inserted))
    }

    /// The projection update, the ledger append, and any review-request scheduling commit in one transaction. The
    /// projection update carries a `WHERE status = <from>` predicate; when it matches nothing the transaction rolls
    /// back and the caller sees [`FulfillmentError::ConcurrentUpdate`].
    async fn apply_transition(
        &self,
        order: &Order,
        transition: &Transition,
        ctx: &TransitionContext,
    ) -> Result<(Order, StatusHistoryEntry), FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let updated = match orders::update_projection(order, transition, ctx, &mut tx).await? {
            Some(updated) => updated,
            None => {
                tx.rollback().await?;
                debug!(
                    "🗃️ Order {} is no longer in {} status. Yielding to the rival writer.",
                    order.order_number, transition.from
                );
                return Err(FulfillmentError::ConcurrentUpdate);
            },
        };
        let entry =
            history::insert_entry(updated.id, transition, ctx.notes.as_deref(), &ctx.changed_by, &mut tx).await?;
        if let Some(due_at) = ctx.review_request_due {
            reviews::schedule(&updated, due_at, &mut tx).await?;
        }
        tx.commit().await?;
        trace!("🗃️ Order {} transitioned to {} (ledger entry {})", updated.order_number, updated.status, entry.id);
        Ok((updated, entry))
    }

    async fn due_review_requests(&self, now: DateTime<Utc>) -> Result<Vec<ReviewRequest>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let requests = reviews::due_requests(now, &mut conn).await?;
        Ok(requests)
    }

    async fn mark_review_request_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<(), FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        reviews::mark_sent(id, sent_at, &mut conn).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), FulfillmentError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
