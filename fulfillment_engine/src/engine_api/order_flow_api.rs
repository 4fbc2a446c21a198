use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Discount, NewOrder, NewOrderItem, Order, OrderId, OrderStatusType, PaymentOutcome, Product},
    engine_api::{
        errors::OrderFlowError,
        order_objects::{CartItem, CheckoutRequest, OrderWithItems},
    },
    events::{EventProducers, OrderAnnulledEvent, OrderCreatedEvent, OrderPaidEvent},
    helpers::{quote, PricingConfig},
    traits::{
        AuthorizationRequest,
        ExchangeRates,
        FulfillmentDatabase,
        FulfillmentError,
        PaymentProcessor,
        SettlementResult,
    },
};

/// `OrderFlowApi` is the primary API for the order lifecycle. It prices and places new orders, reconciles
/// asynchronous payment outcomes from the gateway, and handles explicit and stale-order cancellation.
pub struct OrderFlowApi<B, P, R> {
    db: B,
    processor: P,
    rates: R,
    pricing: PricingConfig,
    producers: EventProducers,
}

impl<B, P, R> Debug for OrderFlowApi<B, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, P, R> OrderFlowApi<B, P, R> {
    pub fn new(db: B, processor: P, rates: R, pricing: PricingConfig, producers: EventProducers) -> Self {
        Self { db, processor, rates, pricing, producers }
    }
}

impl<B, P, R> OrderFlowApi<B, P, R>
where
    B: FulfillmentDatabase,
    P: PaymentProcessor,
    R: ExchangeRates,
{
    /// Places a new order.
    ///
    /// The request is validated and priced, the charge is authorized with the gateway, and only then is anything
    /// written: the order, its line items, the inventory reservations and the discount usage count are persisted in
    /// one transaction. A declined or failed authorization therefore leaves no trace, and a storage failure after
    /// authorization rolls the whole order back.
    ///
    /// The persisted order starts out `Processing` when the charge was confirmed synchronously, and `Pending` when
    /// the outcome will arrive on the webhook.
    pub async fn place_order(&self, request: CheckoutRequest) -> Result<OrderWithItems, OrderFlowError> {
        let order_id = OrderId::random();
        debug!("🛒️ Placing order [{order_id}] for customer {}", request.customer_id);
        validate_request(&request)?;
        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self.resolve_product(line).await?;
            items.push(NewOrderItem::new(product.id, product.name, line.quantity, product.price));
        }
        let discount = match &request.discount_code {
            Some(code) => Some(self.resolve_discount(code).await?),
            None => None,
        };
        let mut quote = quote(&items, discount.as_ref().map(|d| (d.kind, d.value)), &self.pricing);
        let currency = request.currency.to_lowercase();
        if currency != self.pricing.base_currency {
            let rate = self.rates.rate(&self.pricing.base_currency, &currency).await?;
            quote = quote.convert(rate)?;
            for item in &mut items {
                item.unit_price = item.unit_price.convert(rate)?;
            }
            debug!("🛒️ Order [{order_id}] quoted in {currency} at a rate of {rate}");
        }
        let auth = self
            .processor
            .authorize(&AuthorizationRequest {
                order_id: order_id.clone(),
                amount: quote.total_price,
                currency: currency.clone(),
                payment_method: request.payment_method.clone(),
            })
            .await?;
        let mut order = NewOrder::new(order_id, request.customer_id, currency);
        order.status =
            if request.payment_method.is_some() { OrderStatusType::Processing } else { OrderStatusType::Pending };
        order.subtotal = quote.subtotal;
        order.discount_code = discount.as_ref().map(|d| d.code.clone());
        order.discount_kind = discount.as_ref().map(|d| d.kind);
        order.discount_value = discount.as_ref().map(|d| d.value);
        order.discount_amount = quote.discount_amount;
        order.shipping_cost = quote.shipping_cost;
        order.tax_amount = quote.tax_amount;
        order.total_price = quote.total_price;
        order.payment_reference = Some(auth.reference);
        order.shipping_address = request.shipping_address;
        order.billing_address = request.billing_address;
        order.is_gift = request.is_gift;
        order.gift_message = request.gift_message;
        let order = self.db.insert_order_with_items(order, items).await?;
        let items = self.db.fetch_order_items(order.id).await?;
        debug!(
            "🛒️ Order [{}] placed as {} for {} {}",
            order.order_id, order.status, order.total_price, order.currency
        );
        self.call_order_created_hook(&order).await;
        if order.status == OrderStatusType::Processing {
            self.call_order_paid_hook(std::slice::from_ref(&order)).await;
        }
        Ok(OrderWithItems { order, items })
    }

    /// Applies a payment outcome delivered by the gateway. Returns the order as it stands after reconciliation, or
    /// `None` if no order carries the reference, which is not an error: the gateway may deliver events for
    /// authorizations this system never persisted.
    ///
    /// Idempotent. Redelivered outcomes leave the order untouched and fire no hooks.
    pub async fn reconcile_payment(
        &self,
        reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<Option<Order>, OrderFlowError> {
        trace!("🛒️ Reconciling payment {reference} with outcome {outcome}");
        match self.db.settle_payment(reference, outcome).await? {
            SettlementResult::UnknownReference => Ok(None),
            SettlementResult::NoChange(order) => Ok(Some(order)),
            SettlementResult::Settled(order) => {
                match order.status {
                    OrderStatusType::Processing => self.call_order_paid_hook(std::slice::from_ref(&order)).await,
                    OrderStatusType::Failed => self.call_order_annulled_hook(&order).await,
                    _ => {},
                }
                Ok(Some(order))
            },
        }
    }

    /// Cancels an order, releasing its inventory reservations. When `requesting_customer` is given the order must
    /// belong to that customer; foreign orders read as absent.
    pub async fn cancel_order(
        &self,
        order_id: &OrderId,
        requesting_customer: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.cancel_order(order_id, requesting_customer).await?;
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    /// Cancels every `Pending` order older than `max_age`, releasing reservations. Returns the cancelled orders.
    pub async fn cancel_stale_orders(&self, max_age: Duration) -> Result<Vec<Order>, OrderFlowError> {
        let cancelled = self.db.cancel_stale_orders(max_age).await?;
        for order in &cancelled {
            self.call_order_annulled_hook(order).await;
        }
        Ok(cancelled)
    }

    /// Records an inbound webhook event id in the replay ledger. `false` means the gateway has delivered this event
    /// before and it must not be re-applied.
    pub async fn record_webhook_event(&self, event_id: &str, event_type: &str) -> Result<bool, OrderFlowError> {
        Ok(self.db.record_webhook_event(event_id, event_type).await?)
    }

    async fn resolve_product(&self, line: &CartItem) -> Result<Product, OrderFlowError> {
        let product = self
            .db
            .fetch_product(&line.product_id)
            .await?
            .ok_or_else(|| FulfillmentError::ProductNotFound(line.product_id.clone()))?;
        let available = product.available();
        if line.quantity > available {
            return Err(FulfillmentError::InsufficientStock {
                product_id: product.id.clone(),
                requested: line.quantity,
                available,
            }
            .into());
        }
        Ok(product)
    }

    async fn resolve_discount(&self, code: &str) -> Result<Discount, OrderFlowError> {
        self.db
            .fetch_active_discount(code)
            .await?
            .ok_or_else(|| OrderFlowError::ValidationError(format!("discount code {code} is unknown or inactive")))
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            debug!("🛒️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_paid_hook(&self, paid_orders: &[Order]) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🛒️ Notifying order paid hook subscribers");
            for order in paid_orders {
                let event = OrderPaidEvent::new(order.clone());
                emitter.publish_event(event).await;
            }
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🛒️ Notifying order annulled hook subscribers");
            let event = OrderAnnulledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

fn validate_request(request: &CheckoutRequest) -> Result<(), OrderFlowError> {
    if request.customer_id.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("customer id is required".to_string()));
    }
    if request.items.is_empty() {
        return Err(OrderFlowError::ValidationError("empty cart".to_string()));
    }
    if request.items.iter().any(|line| line.quantity <= 0) {
        return Err(OrderFlowError::ValidationError("line item quantities must be positive".to_string()));
    }
    if request.shipping_address.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("shipping address is required".to_string()));
    }
    if request.billing_address.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("billing address is required".to_string()));
    }
    Ok(())
}
