use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test::TestRequest,
};
use chrono::Utc;
use fulfillment_engine::db_types::{Money, Order, OrderId, OrderItem, OrderStatusType, Product};
use serde_json::Value;

pub fn sample_order(status: OrderStatusType) -> Order {
    let now = Utc::now();
    Order {
        id: 1,
        order_id: OrderId("ord-0000000000000001".to_string()),
        customer_id: "cust-001".to_string(),
        status,
        currency: "usd".to_string(),
        subtotal: Money::from(2000),
        discount_code: None,
        discount_kind: None,
        discount_value: None,
        discount_amount: Money::from(0),
        shipping_cost: Money::from(500),
        tax_amount: Money::from(160),
        total_price: Money::from(2660),
        payment_reference: Some("pi_test_ref".to_string()),
        shipping_address: "10 Main St".to_string(),
        billing_address: "10 Main St".to_string(),
        is_gift: false,
        gift_message: None,
        shipped_date: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_items() -> Vec<OrderItem> {
    vec![OrderItem {
        id: 1,
        order_id: 1,
        product_id: "prod-100".to_string(),
        product_name: "Teapot".to_string(),
        quantity: 2,
        unit_price: Money::from(1000),
    }]
}

pub fn sample_product() -> Product {
    let now = Utc::now();
    Product {
        id: "prod-100".to_string(),
        name: "Teapot".to_string(),
        price: Money::from(1000),
        stock: 10,
        reserved: 0,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn checkout_body() -> Value {
    serde_json::json!({
        "customer_id": "cust-001",
        "items": [{"product_id": "prod-100", "quantity": 2}],
        "shipping_address": "10 Main St",
        "billing_address": "10 Main St",
        "payment_method": "pm_card_visa"
    })
}

/// Drives a request through the service and returns the status and body, whether the call succeeded or was
/// rejected by a middleware.
pub async fn send<S, B>(service: &S, req: TestRequest) -> (StatusCode, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match actix_web::test::try_call_service(service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body =
                res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
            (status, body)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body =
                res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
            (status, body)
        },
    }
}
