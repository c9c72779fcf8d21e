use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use fulfillment_engine::{
    db_types::{Order, OrderStatusType, StatusHistoryEntry},
    events::EventProducers,
    FulfillmentApi,
};
use log::debug;
use ofg_common::{Money, Secret};

use crate::{
    config::ServerOptions,
    endpoint_tests::mocks::MockFulfillmentDb,
    helpers::calculate_hmac,
    middleware::AdminKey,
};

// Test keys and secrets. DO NOT re-use these anywhere.
pub const TEST_ADMIN_KEY: &str = "adm_test_5f2b8c41";
pub const TEST_PAYMENT_SECRET: &str = "payment_webhook_test_secret";
pub const TEST_STOREFRONT_SECRET: &str = "storefront_webhook_test_secret";
pub const TEST_VENDOR_SECRET: &str = "vendor_webhook_test_secret";
pub const TEST_NOTIFICATION_URL: &str = "https://fulfillment.test/webhook/payment";

pub fn make_api(db: MockFulfillmentDb) -> FulfillmentApi<MockFulfillmentDb> {
    FulfillmentApi::new(db, EventProducers::default(), Money::from_cents(1), Duration::hours(72))
}

pub fn sample_order(status: OrderStatusType) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Order {
        id: 1,
        order_number: "100042".into(),
        customer_id: "cust-350".into(),
        reference_number: None,
        total: Money::from_cents(6500),
        currency: "USD".into(),
        paid_at: None,
        tracking_number: None,
        carrier: None,
        created_at: ts,
        updated_at: ts,
        status,
    }
}

pub fn sample_entry(order: &Order, to: OrderStatusType, changed_by: &str) -> StatusHistoryEntry {
    StatusHistoryEntry {
        id: 10,
        order_id: order.id,
        from_status: order.status,
        to_status: to,
        notes: None,
        changed_by: changed_by.into(),
        created_at: Utc::now(),
    }
}

/// Signs `body` the way the payment processor does: HMAC over the notification URL followed by the raw payload.
pub fn payment_signature(body: &str) -> String {
    let signed = format!("{TEST_NOTIFICATION_URL}{body}");
    calculate_hmac(TEST_PAYMENT_SECRET, signed.as_bytes())
}

/// Builds the test app, sends the request, and returns the status and body. Middleware rejections come back as
/// error responses rather than panics so tests can assert on the status code.
pub async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(AdminKey(Secret::new(TEST_ADMIN_KEY.to_string()))))
        .app_data(web::Data::new(ServerOptions { use_x_forwarded_for: false, use_forwarded: false }))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = body_string(res.into_body());
            (status, body)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = body_string(res.into_body());
            (status, body)
        },
    }
}

fn body_string<B: MessageBody>(body: B) -> String {
    let bytes = body.try_into_bytes().ok().expect("response body was not buffered");
    String::from_utf8_lossy(&bytes).into_owned()
}
