use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use chrono::Utc;
use fulfillment_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    helpers::PricingConfig,
    traits::{FulfillmentError, SettlementResult},
    OrderFlowApi,
    OrderQueryApi,
};
use sfs_common::Secret;
use stripe_tools::helpers::build_signature;

use crate::{
    config::ServerConfig,
    endpoint_tests::{
        helpers::{sample_order, send},
        mocks::{MockFulfillment, TestGateway, TestRates},
    },
    middleware::{SignatureMiddlewareFactory, PAYMENT_SIGNATURE_HEADER},
    webhook_routes::{PaymentWebhookRoute, ShipmentWebhookRoute},
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test";

fn succeeded_event() -> String {
    serde_json::json!({
        "id": "evt_001",
        "type": "payment_intent.succeeded",
        "created": Utc::now().timestamp(),
        "data": {"object": {"id": "pi_test_ref"}}
    })
    .to_string()
}

fn payment_data(db: MockFulfillment) -> web::Data<OrderFlowApi<MockFulfillment, TestGateway, TestRates>> {
    web::Data::new(OrderFlowApi::new(
        db,
        TestGateway::default(),
        TestRates,
        PricingConfig::default(),
        EventProducers::default(),
    ))
}

/// Builds the payment webhook app exactly as the server registers it: the route inside a scope wrapped with the
/// signature middleware.
macro_rules! payment_service {
    ($db:expr, $secret:expr) => {{
        let scope = web::scope("/webhook")
            .wrap(SignatureMiddlewareFactory::new(Secret::new($secret.to_string()), 300))
            .service(PaymentWebhookRoute::<MockFulfillment, TestGateway, TestRates>::new());
        test::init_service(App::new().app_data(payment_data($db)).service(scope)).await
    }};
}

fn signed_request(body: String, secret: &str) -> TestRequest {
    let header = build_signature(secret, Utc::now().timestamp(), body.as_bytes());
    TestRequest::post()
        .uri("/webhook/payment")
        .insert_header((PAYMENT_SIGNATURE_HEADER, header))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
}

#[actix_web::test]
async fn missing_signature_is_a_400() {
    let service = payment_service!(MockFulfillment::new(), WEBHOOK_SECRET);
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(succeeded_event());
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn tampered_body_is_a_400() {
    let service = payment_service!(MockFulfillment::new(), WEBHOOK_SECRET);
    let header = build_signature(WEBHOOK_SECRET, Utc::now().timestamp(), b"something else entirely");
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .insert_header((PAYMENT_SIGNATURE_HEADER, header))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(succeeded_event());
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn stale_signature_is_a_400() {
    let service = payment_service!(MockFulfillment::new(), WEBHOOK_SECRET);
    let body = succeeded_event();
    let header = build_signature(WEBHOOK_SECRET, Utc::now().timestamp() - 3600, body.as_bytes());
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .insert_header((PAYMENT_SIGNATURE_HEADER, header))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body);
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unconfigured_secret_is_a_503() {
    let service = payment_service!(MockFulfillment::new(), "");
    let req = signed_request(succeeded_event(), WEBHOOK_SECRET);
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn succeeded_event_reconciles_the_order() {
    let mut db = MockFulfillment::new();
    db.expect_record_webhook_event()
        .withf(|id, event_type| id == "evt_001" && event_type == "payment_intent.succeeded")
        .returning(|_, _| Ok(true));
    db.expect_settle_payment()
        .withf(|reference, _| reference == "pi_test_ref")
        .returning(|_, _| Ok(SettlementResult::Settled(sample_order(OrderStatusType::Processing))));
    let service = payment_service!(db, WEBHOOK_SECRET);
    let req = signed_request(succeeded_event(), WEBHOOK_SECRET);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":true"), "{body}");
    assert!(body.contains("Processing"), "{body}");
}

#[actix_web::test]
async fn redelivered_event_reads_as_already_processed() {
    let mut db = MockFulfillment::new();
    // The status gate reports the replay as a no-op; the ledger already holds the event id.
    db.expect_settle_payment()
        .returning(|_, _| Ok(SettlementResult::NoChange(sample_order(OrderStatusType::Processing))));
    db.expect_record_webhook_event().returning(|_, _| Ok(false));
    let service = payment_service!(db, WEBHOOK_SECRET);
    let req = signed_request(succeeded_event(), WEBHOOK_SECRET);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already processed"), "{body}");
}

#[actix_web::test]
async fn failed_settlement_is_not_recorded_so_redelivery_retries_it() {
    let mut db = MockFulfillment::new();
    let mut seq = mockall::Sequence::new();
    db.expect_settle_payment()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(FulfillmentError::DatabaseError("database is locked".to_string())));
    db.expect_settle_payment()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(SettlementResult::Settled(sample_order(OrderStatusType::Processing))));
    // Exactly one ledger write, on the delivery that actually settled.
    db.expect_record_webhook_event().times(1).returning(|_, _| Ok(true));
    let service = payment_service!(db, WEBHOOK_SECRET);
    let (status, body) = send(&service, signed_request(succeeded_event(), WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":false"), "{body}");
    let (status, body) = send(&service, signed_request(succeeded_event(), WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":true"), "{body}");
    assert!(body.contains("Processing"), "{body}");
}

#[actix_web::test]
async fn unknown_reference_is_still_a_200() {
    let mut db = MockFulfillment::new();
    db.expect_record_webhook_event().returning(|_, _| Ok(true));
    db.expect_settle_payment().returning(|_, _| Ok(SettlementResult::UnknownReference));
    let service = payment_service!(db, WEBHOOK_SECRET);
    let req = signed_request(succeeded_event(), WEBHOOK_SECRET);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":false"), "{body}");
}

#[actix_web::test]
async fn unhandled_event_type_is_acknowledged_and_ignored() {
    let db = MockFulfillment::new();
    let service = payment_service!(db, WEBHOOK_SECRET);
    let body = serde_json::json!({
        "id": "evt_002",
        "type": "charge.refunded",
        "data": {"object": {"id": "pi_test_ref"}}
    })
    .to_string();
    let req = signed_request(body, WEBHOOK_SECRET);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Unhandled event type"), "{body}");
}

//----------------------------------------------   Shipment  ----------------------------------------------------

fn shipment_config(token: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.shipment_webhook_token = Secret::new(token.to_string());
    config
}

fn shipment_body(status: &str) -> serde_json::Value {
    serde_json::json!({"order_id": "ord-0000000000000001", "status": status})
}

#[actix_web::test]
async fn shipment_webhook_refuses_when_unconfigured() {
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(MockFulfillment::new())))
        .app_data(web::Data::new(shipment_config("")))
        .service(ShipmentWebhookRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/webhook/shipment").set_json(shipment_body("Shipped"));
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn shipment_webhook_rejects_a_bad_token() {
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(MockFulfillment::new())))
        .app_data(web::Data::new(shipment_config("logistics-token")))
        .service(ShipmentWebhookRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhook/shipment")
        .insert_header(("X-Webhook-Token", "wrong"))
        .set_json(shipment_body("Shipped"));
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn shipment_webhook_marks_the_order_shipped() {
    let mut db = MockFulfillment::new();
    db.expect_mark_order_shipped()
        .withf(|id| id.as_str() == "ord-0000000000000001")
        .returning(|_| {
            let mut order = sample_order(OrderStatusType::Shipped);
            order.shipped_date = Some(Utc::now());
            Ok(order)
        });
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .app_data(web::Data::new(shipment_config("logistics-token")))
        .service(ShipmentWebhookRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhook/shipment")
        .insert_header(("X-Webhook-Token", "logistics-token"))
        .set_json(shipment_body("Shipped"));
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Shipped"), "{body}");
}

#[actix_web::test]
async fn shipment_webhook_rejects_non_shipment_statuses() {
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(MockFulfillment::new())))
        .app_data(web::Data::new(shipment_config("logistics-token")))
        .service(ShipmentWebhookRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhook/shipment")
        .insert_header(("X-Webhook-Token", "logistics-token"))
        .set_json(shipment_body("Cancelled"));
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn shipment_webhook_for_an_unknown_order_is_a_404() {
    let mut db = MockFulfillment::new();
    db.expect_mark_order_shipped().returning(|id| Err(FulfillmentError::OrderNotFound(id.clone())));
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .app_data(web::Data::new(shipment_config("logistics-token")))
        .service(ShipmentWebhookRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhook/shipment")
        .insert_header(("X-Webhook-Token", "logistics-token"))
        .set_json(shipment_body("Shipped"));
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
