//----------------------------------------------   Webhooks  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use fulfillment_engine::{
    db_types::NewOrder,
    normalizer::{PaymentWebhookEvent, VendorWebhookEvent},
    traits::{FulfillmentDatabase, FulfillmentError},
    FulfillmentApi,
    TransitionOutcome,
};
use log::{debug, info, trace, warn};
use ofg_common::Money;

use crate::{
    config::ServerOptions,
    data_objects::{CheckoutPayload, JsonResponse},
    errors::ServerError,
    helpers::get_remote_ip,
};

// These handlers are registered in `server.rs` rather than through the `route!` macro, because each webhook
// resource is wrapped in its own HMAC middleware with its own secret.

/// Handles checkout notifications from the storefront.
///
/// Webhook responses must always be in the 200 range, otherwise the storefront will retry the delivery. Failures
/// are reported in the response body instead.
pub async fn checkout_webhook<B>(
    req: HttpRequest,
    body: web::Json<CheckoutPayload>,
    api: web::Data<FulfillmentApi<B>>,
) -> HttpResponse
where
    B: FulfillmentDatabase,
{
    trace!("🛍️️ Received checkout webhook request: {}", req.uri());
    let payload = body.into_inner();
    let mut order = NewOrder::new(payload.order_number.clone(), payload.customer_id, Money::from_cents(payload.total));
    if let Some(currency) = payload.currency {
        order.currency = currency;
    }
    let result = match api.process_checkout(order).await {
        Ok((order, true)) => {
            info!("🛍️️ Order {} registered and awaiting payment.", order.order_number);
            JsonResponse::success("Order registered.")
        },
        Ok((order, false)) => {
            info!("🛍️️ Order {} already exists. Acknowledging the retry.", order.order_number);
            JsonResponse::success("Order already exists.")
        },
        Err(FulfillmentError::DatabaseError(e)) => {
            warn!("🛍️️ Could not process order {}. {e}", payload.order_number);
            JsonResponse::failure(e)
        },
        Err(e) => {
            warn!("🛍️️ Unexpected error while handling incoming order notification. {e}");
            JsonResponse::failure("Unexpected error handling order.")
        },
    };
    HttpResponse::Ok().json(result)
}

/// Handles payment status events from the payment processor.
///
/// The HMAC middleware has already authenticated the request by the time this handler runs. Unlike the storefront,
/// the processor interprets response codes properly, so errors are returned as real statuses: 400 for payloads we
/// cannot interpret, 404 for unknown orders, 409 for conflicting transitions. The processor retries anything
/// non-2xx, which is exactly what we want for transient failures.
pub async fn payment_webhook<B>(
    req: HttpRequest,
    body: web::Json<PaymentWebhookEvent>,
    api: web::Data<FulfillmentApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let event = body.into_inner();
    let peer_addr = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    trace!("💰️ Received payment webhook event {} ({}) from {peer_addr:?}", event.event_id, event.event_type);
    let outcome = api.process_payment_event(&event).await?;
    let response = transition_ack(&outcome);
    Ok(HttpResponse::Ok().json(response))
}

/// Handles fulfillment progress notifications from vendors.
pub async fn vendor_webhook<B>(
    body: web::Json<VendorWebhookEvent>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
{
    let event = body.into_inner();
    trace!("🚚️ Received vendor webhook from {} for order {}", event.vendor_id, event.order_number);
    let outcome = api.process_vendor_event(&event).await?;
    let response = transition_ack(&outcome);
    Ok(HttpResponse::Ok().json(response))
}

fn transition_ack(outcome: &TransitionOutcome) -> JsonResponse {
    match outcome {
        TransitionOutcome::Applied { order, .. } => {
            debug!("📦️ Order {} is now {}", order.order_number, order.status);
            JsonResponse::success(format!("Order {} is now {}", order.order_number, order.status))
        },
        TransitionOutcome::AlreadyApplied { order } => {
            debug!("📦️ Duplicate event for order {} acknowledged.", order.order_number);
            JsonResponse::success(format!("Event already applied. Order {} is {}", order.order_number, order.status))
        },
    }
}
