use chrono::Utc;
use fulfillment_engine::{
    db_types::ReviewRequest,
    events::{EventProducers, ReviewRequestDueEvent},
    FulfillmentDatabase,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

/// Starts the review request worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker polls the review schedule once a minute and publishes a [`ReviewRequestDueEvent`] for every request
/// that has come due. A request is marked as sent only after it has been published, so a crash between poll and
/// publish re-delivers rather than drops.
pub fn start_review_worker(db: SqliteDatabase, producers: EventProducers) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        info!("🕰️ Review request worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Checking for due review requests");
            let due = match db.due_review_requests(Utc::now()).await {
                Ok(due) => due,
                Err(e) => {
                    error!("🕰️ Error fetching due review requests: {e}");
                    continue;
                },
            };
            if due.is_empty() {
                continue;
            }
            info!("🕰️ {} review requests are due: {}", due.len(), request_list(&due));
            for request in due {
                for emitter in &producers.review_request_due_producer {
                    emitter.publish_event(ReviewRequestDueEvent::new(request.clone())).await;
                }
                if let Err(e) = db.mark_review_request_sent(request.id, Utc::now()).await {
                    error!("🕰️ Could not mark review request {} as sent: {e}", request.id);
                }
            }
        }
    })
}

fn request_list(requests: &[ReviewRequest]) -> String {
    requests
        .iter()
        .map(|r| format!("[{}] order: {} cust_id: {}", r.id, r.order_number, r.customer_id))
        .collect::<Vec<String>>()
        .join(", ")
}
