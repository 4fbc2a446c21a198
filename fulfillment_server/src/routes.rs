//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls, the
//! payment gateway round trip) must therefore be expressed as a future or asynchronous function, so that the worker
//! can interleave other requests while it waits.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use fulfillment_engine::{
    db_types::OrderId,
    order_objects::{CheckoutRequest, OrderQueryFilter},
    traits::{ExchangeRates, FulfillmentDatabase, InventoryManagement, OrderManagement, PaymentProcessor},
    OrderFlowApi,
    OrderQueryApi,
    ProductApi,
};
use log::*;

use crate::{
    config::ServerOptions,
    data_objects::{AvailabilityResponse, CancelOrderRequest, IncludeDeletedParams},
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(create_order => Post "/orders" impl FulfillmentDatabase, PaymentProcessor, ExchangeRates);
/// Route handler for the checkout endpoint.
///
/// The request is priced, the charge is authorized with the gateway, and the order is persisted together with its
/// inventory reservations. A declined card or a sold-out product fails with a 400 and leaves nothing behind.
///
/// The response is the persisted order with its line items, `201 Created`. An order placed without a
/// `payment_method` comes back `Pending`; its payment outcome will arrive on the payment webhook.
pub async fn create_order<B, P, R>(
    req: HttpRequest,
    options: web::Data<ServerOptions>,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    P: PaymentProcessor,
    R: ExchangeRates,
{
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    debug!("💻️ POST /orders from {peer:?}");
    let order = api.place_order(body.into_inner()).await?;
    info!("💻️ Order [{}] created for customer {}", order.order.order_id, order.order.customer_id);
    Ok(HttpResponse::Created().json(order))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders_search => Get "/orders" impl OrderManagement);
/// Route handler for the order search endpoint.
///
/// All filter fields are optional. Soft-deleted orders are excluded unless `include_deleted` is set.
pub async fn orders_search<B: OrderManagement>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders search for [{query}]");
    let orders = api.search_orders(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<OrderId>,
    query: web::Query<IncludeDeletedParams>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id}");
    let order = api
        .fetch_order_with_items(&order_id, query.include_deleted)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl FulfillmentDatabase, PaymentProcessor, ExchangeRates);
/// Route handler for order cancellation.
///
/// Cancels a `Pending` or `Processing` order, releasing its inventory reservations. When the body carries a
/// `customer_id` the order must belong to that customer; foreign orders report 404 rather than 403 so that the
/// endpoint does not leak which order ids exist.
pub async fn cancel_order<B, P, R>(
    path: web::Path<OrderId>,
    body: web::Json<CancelOrderRequest>,
    api: web::Data<OrderFlowApi<B, P, R>>,
) -> Result<HttpResponse, ServerError>
where
    B: FulfillmentDatabase,
    P: PaymentProcessor,
    R: ExchangeRates,
{
    let order_id = path.into_inner();
    let request = body.into_inner();
    debug!("💻️ POST cancel order {order_id}");
    let order = api.cancel_order(&order_id, request.customer_id.as_deref()).await?;
    info!("💻️ Order [{}] cancelled", order.order_id);
    Ok(HttpResponse::Ok().json(order))
}

route!(delete_order => Delete "/orders/{order_id}" impl OrderManagement);
/// Soft-deletes an order. The record stays in the database and remains reachable with `include_deleted` set.
pub async fn delete_order<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ DELETE order {order_id}");
    let order = api.delete_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(restore_order => Post "/orders/{order_id}/restore" impl OrderManagement);
pub async fn restore_order<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST restore order {order_id}");
    let order = api.restore_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(product_availability => Get "/products/{product_id}/availability" impl InventoryManagement);
/// Route handler for the availability endpoint.
///
/// Reports `stock - reserved` for an active product, the number of units a new order could claim right now.
pub async fn product_availability<B: InventoryManagement>(
    path: web::Path<String>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ GET availability for product {product_id}");
    let available = api.available(&product_id).await?;
    Ok(HttpResponse::Ok().json(AvailabilityResponse { product_id, available }))
}
