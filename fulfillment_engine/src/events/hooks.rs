use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    AmountDiscrepancyEvent,
    EventHandler,
    EventProducer,
    Handler,
    OrderTransitionedEvent,
    ReviewRequestDueEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_transitioned_producer: Vec<EventProducer<OrderTransitionedEvent>>,
    pub amount_discrepancy_producer: Vec<EventProducer<AmountDiscrepancyEvent>>,
    pub review_request_due_producer: Vec<EventProducer<ReviewRequestDueEvent>>,
}

pub struct EventHandlers {
    pub on_order_transitioned: Option<EventHandler<OrderTransitionedEvent>>,
    pub on_amount_discrepancy: Option<EventHandler<AmountDiscrepancyEvent>>,
    pub on_review_request_due: Option<EventHandler<ReviewRequestDueEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_transitioned = hooks.on_order_transitioned.map(|f| EventHandler::new(buffer_size, f));
        let on_amount_discrepancy = hooks.on_amount_discrepancy.map(|f| EventHandler::new(buffer_size, f));
        let on_review_request_due = hooks.on_review_request_due.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_transitioned, on_amount_discrepancy, on_review_request_due }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_transitioned {
            result.order_transitioned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_amount_discrepancy {
            result.amount_discrepancy_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_review_request_due {
            result.review_request_due_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_transitioned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_amount_discrepancy {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_review_request_due {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_transitioned: Option<Handler<OrderTransitionedEvent>>,
    pub on_amount_discrepancy: Option<Handler<AmountDiscrepancyEvent>>,
    pub on_review_request_due: Option<Handler<ReviewRequestDueEvent>>,
}

impl EventHooks {
    pub fn on_order_transitioned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderTransitionedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_transitioned = Some(Arc::new(f));
        self
    }

    pub fn on_amount_discrepancy<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AmountDiscrepancyEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_amount_discrepancy = Some(Arc::new(f));
        self
    }

    pub fn on_review_request_due<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReviewRequestDueEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_review_request_due = Some(Arc::new(f));
        self
    }
}
