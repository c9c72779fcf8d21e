use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, guard, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fulfillment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    FulfillmentApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::{AdminKey, HmacMiddlewareFactory},
    review_worker::start_review_worker,
    routes::{health, AdminSetStatusRoute, CustomerOrdersRoute, OrderHistoryRoute, OrderRoute},
    webhook_routes::{checkout_webhook, payment_webhook, vendor_webhook},
};

/// Header carrying the payment processor's signature.
pub const PAYMENT_SIGNATURE_HEADER: &str = "x-payment-signature";
/// Header carrying the storefront's signature on checkout webhooks.
pub const STOREFRONT_SIGNATURE_HEADER: &str = "x-storefront-hmac-sha256";
/// Header carrying the vendor's signature.
pub const VENDOR_SIGNATURE_HEADER: &str = "x-vendor-signature";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.assert_ready_for_payments()?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(128, default_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    start_review_worker(db.clone(), producers.clone());
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let api = FulfillmentApi::new(db.clone(), producers.clone(), config.amount_tolerance, config.review_request_delay);
        let admin_key = AdminKey(config.admin_api_key.clone());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ofg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(admin_key))
            .app_data(web::Data::new(options));
        // Routes that require the admin API key
        let api_scope = web::scope("/api")
            .service(OrderRoute::<SqliteDatabase>::new())
            .service(OrderHistoryRoute::<SqliteDatabase>::new())
            .service(CustomerOrdersRoute::<SqliteDatabase>::new())
            .service(AdminSetStatusRoute::<SqliteDatabase>::new());
        // Each webhook resource carries its own HMAC middleware, since every external party has its own secret
        // and, for the payment processor, its own signing scheme.
        let storefront_checks = !config.storefront_hmac_secret.is_empty();
        let vendor_checks = !config.vendor_hmac_secret.is_empty();
        let webhook_scope = web::scope("/webhook")
            .service(
                web::resource("/checkout")
                    .guard(guard::Post())
                    .route(web::route().to(checkout_webhook::<SqliteDatabase>))
                    .wrap(HmacMiddlewareFactory::new(
                        STOREFRONT_SIGNATURE_HEADER,
                        config.storefront_hmac_secret.clone(),
                        storefront_checks,
                    )),
            )
            .service(
                web::resource("/payment")
                    .guard(guard::Post())
                    .route(web::route().to(payment_webhook::<SqliteDatabase>))
                    .wrap(
                        HmacMiddlewareFactory::new(
                            PAYMENT_SIGNATURE_HEADER,
                            config.payment.hmac_secret.clone(),
                            config.payment.hmac_checks,
                        )
                        .with_signed_prefix(&config.payment.notification_url),
                    ),
            )
            .service(
                web::resource("/vendor")
                    .guard(guard::Post())
                    .route(web::route().to(vendor_webhook::<SqliteDatabase>))
                    .wrap(HmacMiddlewareFactory::new(
                        VENDOR_SIGNATURE_HEADER,
                        config.vendor_hmac_secret.clone(),
                        vendor_checks,
                    )),
            );
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// The default side-effect consumers: structured log lines for every hook.
///
/// Real notification channels (email, SMS) plug in here by replacing these closures; the pipeline itself neither
/// knows nor cares how a notification is delivered.
pub fn default_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_transitioned(|ev| {
        Box::pin(async move {
            if ev.side_effects.notify_customer {
                info!(
                    "📣️ Customer {}: order {} is now {}",
                    ev.order.customer_id, ev.order.order_number, ev.order.status
                );
            } else {
                debug!("📣️ Order {} moved to {} (no customer notification)", ev.order.order_number, ev.order.status);
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_amount_discrepancy(|ev| {
        Box::pin(async move {
            warn!(
                "🚨️ Amount discrepancy on order {}: expected {}, payment {} reported {}. Review the books.",
                ev.order.order_number, ev.expected, ev.processor_payment_id, ev.actual
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_review_request_due(|ev| {
        Box::pin(async move {
            info!(
                "📣️ Review request due for order {} (customer {})",
                ev.request.order_number, ev.request.customer_id
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}
