use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use fulfillment_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    helpers::PricingConfig,
    traits::FulfillmentError,
    OrderFlowApi,
    OrderQueryApi,
    ProductApi,
};

use crate::{
    config::ServerOptions,
    endpoint_tests::{
        helpers::{checkout_body, sample_items, sample_order, sample_product, send},
        mocks::{MockFulfillment, TestGateway, TestRates},
    },
    routes::{
        CancelOrderRoute,
        CreateOrderRoute,
        DeleteOrderRoute,
        OrderByIdRoute,
        OrdersSearchRoute,
        ProductAvailabilityRoute,
    },
};

fn order_flow_data(
    db: MockFulfillment,
    gateway: TestGateway,
) -> web::Data<OrderFlowApi<MockFulfillment, TestGateway, TestRates>> {
    web::Data::new(OrderFlowApi::new(db, gateway, TestRates, PricingConfig::default(), EventProducers::default()))
}

#[actix_web::test]
async fn create_order_returns_201_with_the_persisted_order() {
    let mut db = MockFulfillment::new();
    db.expect_fetch_product().returning(|_| Ok(Some(sample_product())));
    db.expect_insert_order_with_items().returning(|_, _| Ok(sample_order(OrderStatusType::Processing)));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::default()))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(CreateOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/orders").set_json(checkout_body());
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains("ord-0000000000000001"), "{body}");
    assert!(body.contains("Processing"), "{body}");
}

#[actix_web::test]
async fn declined_card_is_a_400_and_nothing_is_persisted() {
    let mut db = MockFulfillment::new();
    db.expect_fetch_product().returning(|_| Ok(Some(sample_product())));
    // No insert expectation. A persistence attempt after the decline fails the test.
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::declining()))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(CreateOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/orders").set_json(checkout_body());
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("declined"), "{body}");
}

#[actix_web::test]
async fn sold_out_product_is_a_400_naming_the_product() {
    let mut db = MockFulfillment::new();
    db.expect_fetch_product().returning(|_| {
        let mut product = sample_product();
        product.stock = 1;
        Ok(Some(product))
    });
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::default()))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(CreateOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/orders").set_json(checkout_body());
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("prod-100"), "{body}");
}

#[actix_web::test]
async fn empty_cart_is_a_400() {
    let db = MockFulfillment::new();
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::default()))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(CreateOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let mut body = checkout_body();
    body["items"] = serde_json::json!([]);
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("empty cart"), "{body}");
}

#[actix_web::test]
async fn fetching_an_unknown_order_is_a_404() {
    let mut db = MockFulfillment::new();
    db.expect_fetch_order_by_order_id().returning(|_, _| Ok(None));
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .service(OrderByIdRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/orders/ord-doesnotexist");
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetching_an_order_returns_it_with_items() {
    let mut db = MockFulfillment::new();
    db.expect_fetch_order_by_order_id()
        .withf(|id, include_deleted| id.as_str() == "ord-0000000000000001" && !include_deleted)
        .returning(|_, _| Ok(Some(sample_order(OrderStatusType::Pending))));
    db.expect_fetch_order_items().returning(|_| Ok(sample_items()));
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .service(OrderByIdRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/orders/ord-0000000000000001");
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Teapot"), "{body}");
}

#[actix_web::test]
async fn cancelling_an_order_returns_the_cancelled_order() {
    let mut db = MockFulfillment::new();
    db.expect_cancel_order()
        .withf(|id, customer| id.as_str() == "ord-0000000000000001" && customer == &Some("cust-001"))
        .returning(|_, _| Ok(sample_order(OrderStatusType::Cancelled)));
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::default()))
        .service(CancelOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/orders/ord-0000000000000001/cancel")
        .set_json(serde_json::json!({"customer_id": "cust-001"}));
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Cancelled"), "{body}");
}

#[actix_web::test]
async fn cancelling_a_shipped_order_is_a_400() {
    let mut db = MockFulfillment::new();
    db.expect_cancel_order().returning(|id, _| {
        Err(FulfillmentError::InvalidStateChange { order_id: id.clone(), status: OrderStatusType::Shipped })
    });
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::default()))
        .service(CancelOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/orders/ord-0000000000000001/cancel").set_json(serde_json::json!({}));
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Shipped"), "{body}");
}

#[actix_web::test]
async fn soft_delete_returns_the_flagged_order() {
    let mut db = MockFulfillment::new();
    db.expect_set_order_delete_flag()
        .withf(|id, deleted| id.as_str() == "ord-0000000000000001" && *deleted)
        .returning(|_, _| {
            let mut order = sample_order(OrderStatusType::Processing);
            order.is_deleted = true;
            Ok(order)
        });
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .service(DeleteOrderRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::delete().uri("/orders/ord-0000000000000001");
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"is_deleted\":true"), "{body}");
}

#[actix_web::test]
async fn order_search_passes_the_filter_through() {
    let mut db = MockFulfillment::new();
    db.expect_search_orders()
        .withf(|query| query.customer_id.as_deref() == Some("cust-001"))
        .returning(|_| Ok(vec![sample_order(OrderStatusType::Pending)]));
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .service(OrdersSearchRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/orders?customer_id=cust-001");
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("cust-001"), "{body}");
}

#[actix_web::test]
async fn order_search_accepts_a_comma_separated_status_filter() {
    let mut db = MockFulfillment::new();
    db.expect_search_orders()
        .withf(|query| query.status == Some(vec![OrderStatusType::Pending, OrderStatusType::Processing]))
        .returning(|_| Ok(vec![sample_order(OrderStatusType::Pending)]));
    let app = App::new()
        .app_data(web::Data::new(OrderQueryApi::new(db)))
        .service(OrdersSearchRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/orders?status=Pending,Processing");
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Pending"), "{body}");
}

#[actix_web::test]
async fn availability_reports_unreserved_stock() {
    let mut db = MockFulfillment::new();
    db.expect_available().withf(|id| id == "prod-100").returning(|_| Ok(7));
    let app = App::new()
        .app_data(web::Data::new(ProductApi::new(db)))
        .service(ProductAvailabilityRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/products/prod-100/availability");
    let (status, body) = send(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"available\":7"), "{body}");
}

#[actix_web::test]
async fn availability_for_an_unknown_product_is_a_404() {
    let mut db = MockFulfillment::new();
    db.expect_available().returning(|id| Err(FulfillmentError::ProductNotFound(id.to_string())));
    let app = App::new()
        .app_data(web::Data::new(ProductApi::new(db)))
        .service(ProductAvailabilityRoute::<MockFulfillment>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri("/products/prod-999/availability");
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn foreign_cancellation_reads_as_not_found() {
    let mut db = MockFulfillment::new();
    db.expect_cancel_order()
        .returning(|id, _| Err(FulfillmentError::OrderNotFound(id.clone())));
    let app = App::new()
        .app_data(order_flow_data(db, TestGateway::default()))
        .service(CancelOrderRoute::<MockFulfillment, TestGateway, TestRates>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/orders/ord-0000000000000001/cancel")
        .set_json(serde_json::json!({"customer_id": "cust-other"}));
    let (status, _) = send(&service, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
