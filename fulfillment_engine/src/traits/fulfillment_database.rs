use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, ReviewRequest, StatusHistoryEntry},
    normalizer::NormalizeError,
    state_machine::{InvalidTransitionError, Transition},
    traits::{OrderManagement, OrderReadError},
};

/// Inputs that accompany a transition into the ledger but are not computed by the state machine: attribution,
/// free-form notes, and the side-effect payloads the caller resolved (tracking data, review-request due time).
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    /// Who caused this transition. Recorded verbatim in the ledger entry.
    pub changed_by: String,
    pub notes: Option<String>,
    /// Assigned at most once per order; backends must not overwrite an existing reference.
    pub reference_number: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    /// When set, a review request row is scheduled for this instant inside the same transaction.
    pub review_request_due: Option<DateTime<Utc>>,
}

impl TransitionContext {
    pub fn new<S: Into<String>>(changed_by: S) -> Self {
        Self { changed_by: changed_by.into(), ..Default::default() }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderNumber),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Transition rejected. {0}")]
    TransitionRejected(#[from] InvalidTransitionError),
    #[error("The order was modified by a concurrent request. Re-read it and try again.")]
    ConcurrentUpdate,
    #[error("Could not interpret the event payload. {0}")]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    ReadError(#[from] OrderReadError),
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// The write-side contract fulfillment backends must honor.
///
/// The load-bearing guarantee is in [`apply_transition`](Self::apply_transition): the projection update, the ledger
/// append, and any scheduled review request commit atomically, and the projection update is predicated on the order
/// still being in the transition's `from` status. A lost race surfaces as
/// [`FulfillmentError::ConcurrentUpdate`] rather than a silently clobbered row.
#[allow(async_fn_in_trait)]
pub trait FulfillmentDatabase: OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Stores a new order in `PENDING_PAYMENT` status, along with its ledger creation row, in a single atomic
    /// transaction. This call is idempotent on `order_number`: resubmitting an existing order returns the stored
    /// record untouched.
    ///
    /// Returns the order and `true` if it was inserted, or the existing order and `false` if it already existed.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), FulfillmentError>;

    /// Commits a validated transition. In one transaction:
    /// * the order projection row is updated (status, timestamps, and any side-effect columns the transition
    ///   carries), guarded by `WHERE status = <transition.from>`;
    /// * a ledger entry is appended;
    /// * if `ctx.review_request_due` is set, a review request row is scheduled.
    ///
    /// Returns the updated order and the appended ledger entry. If the status guard matches zero rows, the whole
    /// transaction rolls back and [`FulfillmentError::ConcurrentUpdate`] is returned.
    async fn apply_transition(
        &self,
        order: &Order,
        transition: &Transition,
        ctx: &TransitionContext,
    ) -> Result<(Order, StatusHistoryEntry), FulfillmentError>;

    /// Returns all review requests due at or before `now` that have not been sent yet.
    async fn due_review_requests(&self, now: DateTime<Utc>) -> Result<Vec<ReviewRequest>, FulfillmentError>;

    /// Marks a review request as sent so the worker does not pick it up again.
    async fn mark_review_request_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<(), FulfillmentError>;

    async fn close(&mut self) -> Result<(), FulfillmentError> {
        Ok(())
    }
}
