//----------------------------------------------   Webhooks  ----------------------------------------------------
//
// The payment gateway and the logistics provider both call back into the server. Neither caller retries on a 2xx,
// and both retry aggressively on anything else, so business failures inside a webhook are logged and acknowledged
// with a 200 rather than surfaced as errors. Only authentication problems (and malformed bodies) get a 4xx/5xx.

use actix_web::{web, HttpRequest, HttpResponse};
use fulfillment_engine::{
    db_types::{OrderId, PaymentOutcome},
    traits::{ExchangeRates, FulfillmentDatabase, OrderManagement, PaymentProcessor},
    OrderFlowApi,
    OrderQueryApi,
};
use log::*;
use stripe_tools::{PaymentEvent, EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED};

use crate::{
    config::ServerConfig,
    data_objects::{JsonResponse, ShipmentUpdate},
    errors::ServerError,
    route,
};

route!(payment_webhook => Post "/payment" impl FulfillmentDatabase, PaymentProcessor, ExchangeRates);
/// Route handler for the payment webhook.
///
/// The signature middleware has already authenticated the request by the time this handler runs; anything that
/// arrives here genuinely came from the gateway. Unrecognized event types are acknowledged and ignored, and
/// recognized outcomes are reconciled onto the order carrying the event's payment reference.
///
/// The event id only enters the replay ledger once settlement has run. A settlement that fails (a transient
/// storage error, say) leaves the id unrecorded, so the gateway's redelivery gets a fresh attempt instead of
/// short-circuiting as a replay. True duplicates are harmless to re-settle: the status gate reports `NoChange`
/// and fires no hooks.
pub async fn payment_webhook<B, P, R>(
    req: HttpRequest,
    body: web::Json<PaymentEvent>,
    api: web::Data<OrderFlowApi<B, P, R>>,
) -> HttpResponse
where
    B: FulfillmentDatabase,
    P: PaymentProcessor,
    R: ExchangeRates,
{
    trace!("💳️ Received payment webhook request: {}", req.uri());
    let event = body.into_inner();
    let outcome = match event.event_type.as_str() {
        EVENT_PAYMENT_SUCCEEDED => PaymentOutcome::Succeeded,
        EVENT_PAYMENT_FAILED => PaymentOutcome::Failed,
        other => {
            warn!("💳️ Ignoring unhandled event type {other} ({})", event.id);
            return HttpResponse::Ok().json(JsonResponse::failure(format!("Unhandled event type: {other}")));
        },
    };
    let result = match api.reconcile_payment(event.reference(), outcome).await {
        Ok(reconciled) => {
            let replay = match api.record_webhook_event(&event.id, &event.event_type).await {
                Ok(recorded) => !recorded,
                Err(e) => {
                    warn!("💳️ Could not record webhook event {} in the replay ledger. {e}", event.id);
                    false
                },
            };
            match reconciled {
                Some(order) if replay => {
                    info!("💳️ Event {} has been delivered before. Order [{}] is unchanged.", event.id, order.order_id);
                    JsonResponse::success("Event already processed.")
                },
                Some(order) => {
                    info!(
                        "💳️ Payment {} reconciled. Order [{}] is now {}.",
                        event.reference(),
                        order.order_id,
                        order.status
                    );
                    JsonResponse::success(format!("Order {} is {}", order.order_id, order.status))
                },
                None => {
                    warn!("💳️ No order carries payment reference {}. Acknowledging and moving on.", event.reference());
                    JsonResponse::failure("No matching order for payment reference.")
                },
            }
        },
        Err(e) => {
            warn!(
                "💳️ Could not reconcile payment {}. Leaving event {} unrecorded for redelivery. {e}",
                event.reference(),
                event.id
            );
            JsonResponse::failure("Could not reconcile payment.")
        },
    };
    HttpResponse::Ok().json(result)
}

route!(shipment_webhook => Post "/webhook/shipment" impl OrderManagement);
/// Route handler for the shipment webhook.
///
/// The logistics provider authenticates with a static token in the `X-Webhook-Token` header. Only the
/// `Shipped` and `Delivered` transitions are accepted; everything else about the lifecycle belongs to the payment
/// flow and the cancellation endpoints.
pub async fn shipment_webhook<B: OrderManagement>(
    req: HttpRequest,
    body: web::Json<ShipmentUpdate>,
    api: web::Data<OrderQueryApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    trace!("🚚️ Received shipment webhook request: {}", req.uri());
    let expected = config.shipment_webhook_token.reveal();
    if expected.trim().is_empty() {
        warn!("🚚️ SFS_SHIPMENT_WEBHOOK_TOKEN is not configured. Refusing shipment webhook.");
        return Err(ServerError::ConfigurationError("The shipment webhook is not configured.".to_string()));
    }
    let token = req.headers().get("X-Webhook-Token").and_then(|v| v.to_str().ok());
    if token != Some(expected.as_str()) {
        warn!("🚚️ Shipment webhook called with a missing or invalid token. Denying access.");
        return Ok(HttpResponse::Unauthorized().json(JsonResponse::failure("Invalid webhook token.")));
    }
    let update = body.into_inner();
    let order_id = OrderId(update.order_id.clone());
    let order = match update.status.as_str() {
        "Shipped" => api.mark_shipped(&order_id).await?,
        "Delivered" => api.mark_delivered(&order_id).await?,
        other => {
            debug!("🚚️ Shipment webhook for {order_id} carried unsupported status {other}");
            return Err(ServerError::ValidationError(format!(
                "Status {other} is not a shipment status. Only Shipped and Delivered are accepted."
            )));
        },
    };
    info!("🚚️ Order [{}] is now {}", order.order_id, order.status);
    Ok(HttpResponse::Ok().json(order))
}
