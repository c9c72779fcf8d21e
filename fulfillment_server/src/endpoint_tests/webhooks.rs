use actix_web::{guard, http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fulfillment_engine::db_types::OrderStatusType;
use ofg_common::Secret;

use super::helpers::{
    make_api,
    payment_signature,
    sample_entry,
    sample_order,
    send_request,
    TEST_NOTIFICATION_URL,
    TEST_PAYMENT_SECRET,
    TEST_STOREFRONT_SECRET,
    TEST_VENDOR_SECRET,
};
use crate::{
    endpoint_tests::mocks::MockFulfillmentDb,
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    server::{PAYMENT_SIGNATURE_HEADER, STOREFRONT_SIGNATURE_HEADER, VENDOR_SIGNATURE_HEADER},
    webhook_routes::{checkout_webhook, payment_webhook, vendor_webhook},
};

fn payment_body(status: &str) -> String {
    format!(
        r#"{{"event_id":"evt_1","type":"payment.updated","data":{{"object":{{"payment":{{"id":"pay_77","status":"{status}","amount_money":{{"amount":6500,"currency":"USD"}},"reference_id":"100042"}}}}}}}}"#
    )
}

fn payment_request(body: &str) -> TestRequest {
    TestRequest::post()
        .uri("/webhook/payment")
        .insert_header(("content-type", "application/json"))
        .insert_header((PAYMENT_SIGNATURE_HEADER, payment_signature(body)))
        .set_payload(body.to_string())
}

#[actix_web::test]
async fn payment_webhook_rejects_missing_signature() {
    let _ = env_logger::try_init().ok();
    let body = payment_body("COMPLETED");
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .insert_header(("content-type", "application/json"))
        .set_payload(body);
    let (status, body) = send_request(req, configure_payment_untouched).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "No HMAC signature found.");
}

#[actix_web::test]
async fn payment_webhook_rejects_invalid_signature() {
    let _ = env_logger::try_init().ok();
    let body = payment_body("COMPLETED");
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .insert_header(("content-type", "application/json"))
        .insert_header((PAYMENT_SIGNATURE_HEADER, "aW52YWxpZCBzaWduYXR1cmU="))
        .set_payload(body);
    let (status, body) = send_request(req, configure_payment_untouched).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn payment_webhook_confirms_pending_order() {
    let _ = env_logger::try_init().ok();
    let body = payment_body("COMPLETED");
    let (status, body) = send_request(payment_request(&body), configure_payment_confirms).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Order #100042 is now CONFIRMATION"), "unexpected body: {body}");
}

#[actix_web::test]
async fn duplicate_payment_webhook_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = payment_body("COMPLETED");
    let (status, body) = send_request(payment_request(&body), configure_payment_already_delivered).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Event already applied"), "unexpected body: {body}");
}

#[actix_web::test]
async fn payment_webhook_for_unknown_order_is_404() {
    let _ = env_logger::try_init().ok();
    let body = payment_body("COMPLETED");
    let (status, _) = send_request(payment_request(&body), configure_payment_no_order).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_webhook_with_unknown_status_is_400() {
    let _ = env_logger::try_init().ok();
    // `PENDING` never maps to a fulfillment event, so the payload is rejected before any database access.
    let body = payment_body("PENDING");
    let (status, _) = send_request(payment_request(&body), configure_payment_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn vendor_webhook_ships_order_in_production() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_number":"100042","vendor_id":"vendor-eu-1","status":"shipped","details":{"tracking_number":"TRK123","carrier":"DHL"}}"#;
    let req = TestRequest::post()
        .uri("/webhook/vendor")
        .insert_header(("content-type", "application/json"))
        .insert_header((VENDOR_SIGNATURE_HEADER, calculate_hmac(TEST_VENDOR_SECRET, body.as_bytes())))
        .set_payload(body);
    let (status, body) = send_request(req, configure_vendor_ships).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Order #100042 is now SHIPPED"), "unexpected body: {body}");
}

#[actix_web::test]
async fn vendor_cannot_ship_an_order_on_hold() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_number":"100042","vendor_id":"vendor-eu-1","status":"shipped"}"#;
    let req = TestRequest::post()
        .uri("/webhook/vendor")
        .insert_header(("content-type", "application/json"))
        .insert_header((VENDOR_SIGNATURE_HEADER, calculate_hmac(TEST_VENDOR_SECRET, body.as_bytes())))
        .set_payload(body);
    let (status, _) = send_request(req, configure_vendor_on_hold).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn checkout_webhook_registers_new_order() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_number":"100042","customer_id":"cust-350","total":6500,"currency":"USD"}"#;
    let req = TestRequest::post()
        .uri("/webhook/checkout")
        .insert_header(("content-type", "application/json"))
        .insert_header((STOREFRONT_SIGNATURE_HEADER, calculate_hmac(TEST_STOREFRONT_SECRET, body.as_bytes())))
        .set_payload(body);
    let (status, body) = send_request(req, configure_checkout_inserts).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Order registered"), "unexpected body: {body}");
}

#[actix_web::test]
async fn resubmitted_checkout_still_returns_200() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_number":"100042","customer_id":"cust-350","total":6500}"#;
    let req = TestRequest::post()
        .uri("/webhook/checkout")
        .insert_header(("content-type", "application/json"))
        .insert_header((STOREFRONT_SIGNATURE_HEADER, calculate_hmac(TEST_STOREFRONT_SECRET, body.as_bytes())))
        .set_payload(body);
    let (status, body) = send_request(req, configure_checkout_duplicate).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already exists"), "unexpected body: {body}");
}

//----------------------------------------   Service configurations  -------------------------------------------

fn payment_resource(cfg: &mut ServiceConfig, db: MockFulfillmentDb) {
    cfg.app_data(web::Data::new(make_api(db))).service(
        web::resource("/webhook/payment")
            .guard(guard::Post())
            .route(web::route().to(payment_webhook::<MockFulfillmentDb>))
            .wrap(
                HmacMiddlewareFactory::new(PAYMENT_SIGNATURE_HEADER, Secret::new(TEST_PAYMENT_SECRET.into()), true)
                    .with_signed_prefix(TEST_NOTIFICATION_URL),
            ),
    );
}

fn vendor_resource(cfg: &mut ServiceConfig, db: MockFulfillmentDb) {
    cfg.app_data(web::Data::new(make_api(db))).service(
        web::resource("/webhook/vendor")
            .guard(guard::Post())
            .route(web::route().to(vendor_webhook::<MockFulfillmentDb>))
            .wrap(HmacMiddlewareFactory::new(VENDOR_SIGNATURE_HEADER, Secret::new(TEST_VENDOR_SECRET.into()), true)),
    );
}

fn checkout_resource(cfg: &mut ServiceConfig, db: MockFulfillmentDb) {
    cfg.app_data(web::Data::new(make_api(db))).service(
        web::resource("/webhook/checkout")
            .guard(guard::Post())
            .route(web::route().to(checkout_webhook::<MockFulfillmentDb>))
            .wrap(HmacMiddlewareFactory::new(
                STOREFRONT_SIGNATURE_HEADER,
                Secret::new(TEST_STOREFRONT_SECRET.into()),
                true,
            )),
    );
}

/// A database that must not be touched at all. Any call panics, which proves the request was rejected upstream.
fn configure_payment_untouched(cfg: &mut ServiceConfig) {
    payment_resource(cfg, MockFulfillmentDb::new());
}

fn configure_payment_confirms(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::PendingPayment))));
    db.expect_apply_transition()
        .withf(|_, transition, ctx| {
            transition.to == OrderStatusType::Confirmation && ctx.reference_number.as_deref() == Some("pay_77")
        })
        .returning(|order, transition, ctx| {
            let mut updated = order.clone();
            updated.status = transition.to;
            updated.reference_number = ctx.reference_number.clone();
            let entry = sample_entry(order, transition.to, "payment-processor");
            Ok((updated, entry))
        });
    payment_resource(cfg, db);
}

fn configure_payment_already_delivered(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::Delivered))));
    payment_resource(cfg, db);
}

fn configure_payment_no_order(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(None));
    payment_resource(cfg, db);
}

fn configure_vendor_ships(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::Production))));
    db.expect_apply_transition()
        .withf(|_, transition, ctx| {
            transition.to == OrderStatusType::Shipped && ctx.tracking_number.as_deref() == Some("TRK123")
        })
        .returning(|order, transition, ctx| {
            let mut updated = order.clone();
            updated.status = transition.to;
            updated.tracking_number = ctx.tracking_number.clone();
            updated.carrier = ctx.carrier.clone();
            let entry = sample_entry(order, transition.to, "vendor-eu-1");
            Ok((updated, entry))
        });
    vendor_resource(cfg, db);
}

fn configure_vendor_on_hold(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::OnHold))));
    vendor_resource(cfg, db);
}

fn configure_checkout_inserts(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_insert_order().returning(|order| {
        let mut stored = sample_order(OrderStatusType::PendingPayment);
        stored.order_number = order.order_number;
        Ok((stored, true))
    });
    checkout_resource(cfg, db);
}

fn configure_checkout_duplicate(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_insert_order()
        .returning(|_| Ok((sample_order(OrderStatusType::Confirmation), false)));
    checkout_resource(cfg, db);
}
