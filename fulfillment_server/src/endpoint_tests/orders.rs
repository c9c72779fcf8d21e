use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fulfillment_engine::db_types::OrderStatusType;

use super::helpers::{make_api, sample_entry, sample_order, send_request, TEST_ADMIN_KEY};
use crate::{
    data_objects::JsonResponse,
    endpoint_tests::mocks::MockFulfillmentDb,
    middleware::ADMIN_KEY_HEADER,
    routes::{AdminSetStatusRoute, CustomerOrdersRoute, OrderHistoryRoute, OrderRoute},
};

fn get(path: &str) -> TestRequest {
    TestRequest::get().uri(path).insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
}

#[actix_web::test]
async fn fetch_order_without_api_key() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/orders/100042"), configure_reads).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "No API key provided");
}

#[actix_web::test]
async fn fetch_order_with_wrong_api_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/orders/100042").insert_header((ADMIN_KEY_HEADER, "nope"));
    let (status, body) = send_request(req, configure_reads).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid API key");
}

#[actix_web::test]
async fn fetch_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(get("/orders/100042"), configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""order_number":"100042""#), "unexpected body: {body}");
    assert!(body.contains(r#""status":"PRODUCTION""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_missing_order_is_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(get("/orders/999999"), configure_no_order).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // Failures carry the same envelope as successes
    let envelope: JsonResponse = serde_json::from_str(&body).expect("body was not a JsonResponse");
    assert!(!envelope.success);
    assert!(envelope.message.contains("Order #999999"), "unexpected message: {}", envelope.message);
}

#[actix_web::test]
async fn fetch_order_history() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(get("/orders/100042/history"), configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""history":["#), "unexpected body: {body}");
    assert!(body.contains(r#""changed_by":"payment-processor""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_customer_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(get("/customers/cust-350/orders"), configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with('['), "unexpected body: {body}");
    assert!(body.contains(r#""customer_id":"cust-350""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn admin_moves_order_to_production() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"status":"PRODUCTION","updated_by":"admin:alice","reason":"vendor confirmed capacity"}"#;
    let req = TestRequest::post()
        .uri("/orders/100042/status")
        .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
        .insert_header(("content-type", "application/json"))
        .set_payload(body);
    let (status, body) = send_request(req, configure_admin_to_production).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is now PRODUCTION"), "unexpected body: {body}");
}

#[actix_web::test]
async fn admin_cannot_skip_ahead() {
    let _ = env_logger::try_init().ok();
    // Delivery straight out of pending payment is not an edge of the graph.
    let body = r#"{"status":"DELIVERED","updated_by":"admin:alice"}"#;
    let req = TestRequest::post()
        .uri("/orders/100042/status")
        .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
        .insert_header(("content-type", "application/json"))
        .set_payload(body);
    let (status, body) = send_request(req, configure_admin_pending).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let envelope: JsonResponse = serde_json::from_str(&body).expect("body was not a JsonResponse");
    assert!(!envelope.success);
}

#[actix_web::test]
async fn admin_confirmation_carries_a_reference_number() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"status":"CONFIRMATION","updated_by":"admin:alice","reason":"paid by bank transfer"}"#;
    let req = TestRequest::post()
        .uri("/orders/100042/status")
        .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
        .insert_header(("content-type", "application/json"))
        .set_payload(body);
    let (status, body) = send_request(req, configure_admin_confirmation).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is now CONFIRMATION"), "unexpected body: {body}");
}

#[actix_web::test]
async fn admin_cannot_reset_to_pending_payment() {
    let _ = env_logger::try_init().ok();
    // No event leads back to PENDING_PAYMENT, so the request is malformed rather than a conflict.
    let body = r#"{"status":"PENDING_PAYMENT","updated_by":"admin:alice"}"#;
    let req = TestRequest::post()
        .uri("/orders/100042/status")
        .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
        .insert_header(("content-type", "application/json"))
        .set_payload(body);
    let (status, _) = send_request(req, configure_admin_pending).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//----------------------------------------   Service configurations  -------------------------------------------

fn admin_routes(cfg: &mut ServiceConfig, db: MockFulfillmentDb) {
    cfg.app_data(web::Data::new(make_api(db)))
        .service(OrderRoute::<MockFulfillmentDb>::new())
        .service(OrderHistoryRoute::<MockFulfillmentDb>::new())
        .service(CustomerOrdersRoute::<MockFulfillmentDb>::new())
        .service(AdminSetStatusRoute::<MockFulfillmentDb>::new());
}

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::Production))));
    db.expect_history_for_order().returning(|_| {
        let order = sample_order(OrderStatusType::Production);
        Ok(vec![
            sample_entry(&sample_order(OrderStatusType::PendingPayment), OrderStatusType::Confirmation, "payment-processor"),
            sample_entry(&sample_order(OrderStatusType::Confirmation), OrderStatusType::Production, &order.customer_id),
        ])
    });
    db.expect_orders_for_customer().returning(|_| Ok(vec![sample_order(OrderStatusType::Production)]));
    admin_routes(cfg, db);
}

fn configure_no_order(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(None));
    admin_routes(cfg, db);
}

fn configure_admin_to_production(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::Confirmation))));
    db.expect_apply_transition()
        .withf(|_, transition, ctx| {
            transition.to == OrderStatusType::Production && ctx.changed_by == "admin:alice"
        })
        .returning(|order, transition, _| {
            let mut updated = order.clone();
            updated.status = transition.to;
            let entry = sample_entry(order, transition.to, "admin:alice");
            Ok((updated, entry))
        });
    admin_routes(cfg, db);
}

fn configure_admin_confirmation(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::PendingPayment))));
    db.expect_apply_transition()
        .withf(|_, transition, ctx| {
            // Manual confirmations must still assign the reference number
            transition.to == OrderStatusType::Confirmation &&
                ctx.reference_number.as_deref() == Some("manual-100042")
        })
        .returning(|order, transition, ctx| {
            let mut updated = order.clone();
            updated.status = transition.to;
            updated.reference_number = ctx.reference_number.clone();
            let entry = sample_entry(order, transition.to, "admin:alice");
            Ok((updated, entry))
        });
    admin_routes(cfg, db);
}

fn configure_admin_pending(cfg: &mut ServiceConfig) {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order(OrderStatusType::PendingPayment))));
    admin_routes(cfg, db);
}
