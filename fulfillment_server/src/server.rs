use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fulfillment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    sqlite::create_database_and_migrate,
    OrderFlowApi,
    OrderQueryApi,
    ProductApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{ConfiguredRates, StripeGateway},
    middleware::SignatureMiddlewareFactory,
    routes::{
        health,
        CancelOrderRoute,
        CreateOrderRoute,
        DeleteOrderRoute,
        OrderByIdRoute,
        OrdersSearchRoute,
        ProductAvailabilityRoute,
        RestoreOrderRoute,
    },
    stale_order_worker::start_stale_order_worker,
    webhook_routes::{PaymentWebhookRoute, ShipmentWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    create_database_and_migrate(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        StripeGateway::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let rates = ConfiguredRates::from_env();
    let producers = start_notification_hooks().await;
    let worker_api =
        OrderFlowApi::new(db.clone(), gateway.clone(), rates.clone(), config.pricing.clone(), producers.clone());
    start_stale_order_worker(worker_api, config.pending_order_timeout);
    let srv = create_server_instance(config, db, gateway, rates, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Subscribes the built-in notification hooks to the engine's order events and starts their handler tasks.
///
/// The hooks currently just log. They are the seam where customer notifications (order confirmations, payment
/// failure emails) plug in without touching the order flow itself.
pub async fn start_notification_hooks() -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|event| {
        Box::pin(async move {
            info!("📬️ Order [{}] created for customer {}", event.order.order_id, event.order.customer_id);
        })
    });
    hooks.on_order_paid(|event| {
        Box::pin(async move {
            info!(
                "📬️ Order [{}] paid. {} {} for customer {}",
                event.order.order_id, event.order.total_price, event.order.currency, event.order.customer_id
            );
        })
    });
    hooks.on_order_annulled(|event| {
        Box::pin(async move {
            info!("📬️ Order [{}] annulled with status {}", event.order.order_id, event.status);
        })
    });
    let handlers = EventHandlers::new(25, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    producers
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
    rates: ConfiguredRates,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let order_flow_api = OrderFlowApi::new(
            db.clone(),
            gateway.clone(),
            rates.clone(),
            config.pricing.clone(),
            producers.clone(),
        );
        let orders_api = OrderQueryApi::new(db.clone());
        let products_api = ProductApi::new(db.clone());
        let options = ServerOptions::from_config(&config);
        let signature_check = SignatureMiddlewareFactory::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.signature_tolerance_seconds,
        );
        // The signature middleware only guards the payment webhook. The shipment webhook authenticates with its
        // static token inside the handler, so it is registered outside the scope, ahead of it.
        let payment_scope =
            web::scope("/webhook").wrap(signature_check).service(PaymentWebhookRoute::<
                SqliteDatabase,
                StripeGateway,
                ConfiguredRates,
            >::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sfs::access_log"))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(products_api))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(CreateOrderRoute::<SqliteDatabase, StripeGateway, ConfiguredRates>::new())
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase, StripeGateway, ConfiguredRates>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new())
            .service(RestoreOrderRoute::<SqliteDatabase>::new())
            .service(ProductAvailabilityRoute::<SqliteDatabase>::new())
            .service(ShipmentWebhookRoute::<SqliteDatabase>::new())
            .service(payment_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
