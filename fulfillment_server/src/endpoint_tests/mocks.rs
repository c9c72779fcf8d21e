use chrono::{DateTime, Utc};
use fulfillment_engine::{
    db_types::{NewOrder, Order, OrderNumber, ReviewRequest, StatusHistoryEntry},
    state_machine::Transition,
    traits::{FulfillmentDatabase, FulfillmentError, OrderManagement, OrderReadError, TransitionContext},
};
use mockall::mock;

mock! {
    pub FulfillmentDb {}
    impl OrderManagement for FulfillmentDb {
        async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderReadError>;
        async fn history_for_order(&self, order_number: &OrderNumber) -> Result<Vec<StatusHistoryEntry>, OrderReadError>;
        async fn orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderReadError>;
    }
    impl FulfillmentDatabase for FulfillmentDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), FulfillmentError>;
        async fn apply_transition(
            &self,
            order: &Order,
            transition: &Transition,
            ctx: &TransitionContext,
        ) -> Result<(Order, StatusHistoryEntry), FulfillmentError>;
        async fn due_review_requests(&self, now: DateTime<Utc>) -> Result<Vec<ReviewRequest>, FulfillmentError>;
        async fn mark_review_request_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<(), FulfillmentError>;
        async fn close(&mut self) -> Result<(), FulfillmentError>;
    }
}
