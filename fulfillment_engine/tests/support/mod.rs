//! Shared scaffolding for the engine integration tests: a throwaway migrated database, catalogue seeding, and
//! in-memory stand-ins for the payment gateway and the rate source.

use fulfillment_engine::{
    db_types::{DiscountKind, Money, NewProduct, OrderId},
    events::EventProducers,
    helpers::PricingConfig,
    order_objects::{CartItem, CheckoutRequest},
    sqlite::create_database_and_migrate,
    traits::{
        AuthorizationRequest,
        ExchangeRateError,
        ExchangeRates,
        InventoryManagement,
        PaymentAuthorization,
        PaymentProcessor,
        PaymentProcessorError,
    },
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

pub async fn prepare_test_db() -> SqliteDatabase {
    prepare_test_db_with(5).await
}

pub async fn prepare_test_db_with(max_connections: u32) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    std::fs::create_dir_all("../data").ok();
    let url = random_db_path();
    create_database_and_migrate(&url).await.expect("Error creating test database");
    debug!("🚀️ Test database ready at {url}");
    SqliteDatabase::new_with_url(&url, max_connections).await.expect("Error connecting to test database")
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}.db", rand::random::<u64>())
}

/// An order flow wired to the test gateway and a flat 0.9 usd:eur rate table, with no event subscribers.
pub fn order_flow(db: SqliteDatabase) -> OrderFlowApi<SqliteDatabase, TestGateway, TestRates> {
    let producers = EventProducers::default();
    OrderFlowApi::new(db, TestGateway::default(), TestRates::default(), PricingConfig::default(), producers)
}

pub async fn seed_product(db: &SqliteDatabase, id: &str, name: &str, price: i64, stock: i64) {
    let product = NewProduct::new(id, name, Money::from(price), stock);
    db.insert_product(product).await.expect("Error seeding product");
}

/// A checkout for `items` with a card attached, paid synchronously unless the caller clears `payment_method`.
pub fn checkout(customer_id: &str, items: &[(&str, i64)]) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: customer_id.to_string(),
        items: items.iter().map(|(id, qty)| CartItem { product_id: id.to_string(), quantity: *qty }).collect(),
        currency: "usd".to_string(),
        shipping_address: "14 Pine Ave, Springfield".to_string(),
        billing_address: "14 Pine Ave, Springfield".to_string(),
        payment_method: Some("pm_card_visa".to_string()),
        discount_code: None,
        is_gift: false,
        gift_message: None,
    }
}

/// Rewinds an order's creation time so the reaper sees it as stale.
pub async fn backdate_order(db: &SqliteDatabase, order_id: &OrderId, minutes: i64) {
    let q = format!("UPDATE orders SET created_at = datetime(CURRENT_TIMESTAMP, '-{minutes} minutes') WHERE order_id = $1");
    sqlx::query(&q).bind(&order_id.0).execute(db.pool()).await.expect("Error backdating order");
}

pub async fn seed_discount(db: &SqliteDatabase, code: &str, kind: DiscountKind, value: i64, active: bool) {
    sqlx::query("INSERT INTO discount_codes (code, kind, value, is_active) VALUES (UPPER($1), $2, $3, $4)")
        .bind(code)
        .bind(kind.to_string())
        .bind(value)
        .bind(active)
        .execute(db.pool())
        .await
        .expect("Error seeding discount code");
}

/// Gateway stand-in. Hands out `pi_test_<order id>` references, or declines everything when `decline_all` is set.
#[derive(Debug, Clone, Default)]
pub struct TestGateway {
    pub decline_all: bool,
}

impl PaymentProcessor for TestGateway {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<PaymentAuthorization, PaymentProcessorError> {
        if self.decline_all && request.payment_method.is_some() {
            return Err(PaymentProcessorError::Declined("card was declined".to_string()));
        }
        Ok(PaymentAuthorization { reference: format!("pi_test_{}", request.order_id.0) })
    }
}

/// Rate table stand-in: usd quotes in eur at 0.9, every other pair is unknown.
#[derive(Debug, Clone, Default)]
pub struct TestRates;

impl ExchangeRates for TestRates {
    async fn rate(&self, from: &str, to: &str) -> Result<f64, ExchangeRateError> {
        if from == "usd" && to == "eur" {
            Ok(0.9)
        } else {
            Err(ExchangeRateError::RateDoesNotExist(format!("{from}->{to}")))
        }
    }
}
