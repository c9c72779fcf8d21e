//! Stateless pub-sub plumbing for fulfillment side effects.
//!
//! Side-effect consumers (notification senders, discrepancy alerting, review-request mailers) register async
//! closures against named hooks and receive events over an mpsc channel. Handlers see only the event payload; they
//! never reach back into the pipeline's state, which keeps the transition path free of consumer failures.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Owns the receiving half of an event channel and fans every event out to the registered handler closure.
///
/// Each event is handled on its own spawned task, so a slow consumer delays its successors only by the channel's
/// buffer depth. `start_handler` runs until every [`EventProducer`] has been dropped, then drains in-flight tasks
/// before returning.
pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // The internal sender must go before the recv loop, or the channel never reports closed.
        drop(self.sender);
        let mut in_flight = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Dispatching event");
            let handler = Arc::clone(&self.handler);
            in_flight.spawn(async move {
                (handler)(ev).await;
                trace!("📬️ Event handled");
            });
            // Reap whatever has already finished so the set does not grow without bound.
            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ An event consumer failed: {e}");
                }
            }
        }
        debug!("📬️ Channel closed. Draining {} in-flight consumer(s)", in_flight.len());
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                warn!("📬️ An event consumer failed during shutdown: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

/// Cloneable sending half of an event channel. Publishing never blocks the caller beyond channel backpressure and
/// never fails the pipeline; a closed channel is logged and the event dropped.
#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
