use chrono::Duration;
use fulfillment_engine::{
    db_types::{
        Discount,
        NewOrder,
        NewOrderItem,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        PaymentOutcome,
        Product,
    },
    order_objects::OrderQueryFilter,
    traits::{
        AuthorizationRequest,
        ExchangeRateError,
        ExchangeRates,
        FulfillmentDatabase,
        FulfillmentError,
        InventoryManagement,
        OrderManagement,
        PaymentAuthorization,
        PaymentProcessor,
        PaymentProcessorError,
        SettlementResult,
    },
};
use mockall::mock;

mock! {
    pub Fulfillment {}

    impl Clone for Fulfillment {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for Fulfillment {
        async fn fetch_order_by_order_id(&self, order_id: &OrderId, include_deleted: bool) -> Result<Option<Order>, FulfillmentError>;
        async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, FulfillmentError>;
        async fn fetch_order_items(&self, id: i64) -> Result<Vec<OrderItem>, FulfillmentError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, FulfillmentError>;
        async fn set_order_delete_flag(&self, order_id: &OrderId, deleted: bool) -> Result<Order, FulfillmentError>;
        async fn mark_order_shipped(&self, order_id: &OrderId) -> Result<Order, FulfillmentError>;
        async fn mark_order_delivered(&self, order_id: &OrderId) -> Result<Order, FulfillmentError>;
    }

    impl InventoryManagement for Fulfillment {
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError>;
        async fn fetch_product_any(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError>;
        async fn fetch_products(&self, include_deleted: bool) -> Result<Vec<Product>, FulfillmentError>;
        async fn insert_product(&self, product: NewProduct) -> Result<Product, FulfillmentError>;
        async fn available(&self, product_id: &str) -> Result<i64, FulfillmentError>;
        async fn reserve(&self, product_id: &str, quantity: i64) -> Result<(), FulfillmentError>;
        async fn release(&self, product_id: &str, quantity: i64) -> Result<(), FulfillmentError>;
        async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<Product, FulfillmentError>;
        async fn set_product_delete_flag(&self, product_id: &str, deleted: bool) -> Result<Product, FulfillmentError>;
    }

    impl FulfillmentDatabase for Fulfillment {
        fn url(&self) -> &str;
        async fn insert_order_with_items(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Order, FulfillmentError>;
        async fn settle_payment(&self, reference: &str, outcome: PaymentOutcome) -> Result<SettlementResult, FulfillmentError>;
        async fn cancel_order<'a>(&self, order_id: &OrderId, requesting_customer: Option<&'a str>) -> Result<Order, FulfillmentError>;
        async fn cancel_stale_orders(&self, max_age: Duration) -> Result<Vec<Order>, FulfillmentError>;
        async fn fetch_active_discount(&self, code: &str) -> Result<Option<Discount>, FulfillmentError>;
        async fn record_webhook_event(&self, event_id: &str, event_type: &str) -> Result<bool, FulfillmentError>;
    }
}

/// A gateway stand-in that authorizes everything, or declines everything, depending on how it is built.
#[derive(Clone, Default)]
pub struct TestGateway {
    pub decline: bool,
}

impl TestGateway {
    pub fn declining() -> Self {
        Self { decline: true }
    }
}

impl PaymentProcessor for TestGateway {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<PaymentAuthorization, PaymentProcessorError> {
        if self.decline {
            Err(PaymentProcessorError::Declined("Your card was declined.".to_string()))
        } else {
            Ok(PaymentAuthorization { reference: format!("pi_test_{}", request.order_id.as_str()) })
        }
    }
}

/// Identity rates only. Orders in the base currency never consult this.
#[derive(Clone, Default)]
pub struct TestRates;

impl ExchangeRates for TestRates {
    async fn rate(&self, from: &str, to: &str) -> Result<f64, ExchangeRateError> {
        if from.eq_ignore_ascii_case(to) {
            Ok(1.0)
        } else {
            Err(ExchangeRateError::RateDoesNotExist(format!("{from}:{to}")))
        }
    }
}
