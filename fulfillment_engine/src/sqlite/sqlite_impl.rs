//! `SqliteDatabase` is a concrete implementation of a fulfillment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, discounts, new_pool, orders, products, webhook_events};
use crate::{
    db_types::{
        Discount,
        NewOrder,
        NewOrderItem,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        PaymentOutcome,
        Product,
    },
    engine_api::OrderQueryFilter,
    traits::{
        FulfillmentDatabase,
        FulfillmentError,
        InventoryManagement,
        OrderManagement,
        SettlementResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl FulfillmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order_with_items(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        if let Some(id) = orders::order_exists(&order.order_id, &mut tx).await? {
            debug!("🗃️ Order [{}] already exists in the DB with id {id}", order.order_id);
            return Err(FulfillmentError::OrderAlreadyExists(order.order_id));
        }
        let discount_code = order.discount_code.clone();
        let order = orders::insert_order(order, &mut tx).await?;
        debug!("🗃️ Order [{}] has been saved in the DB with id {}", order.order_id, order.id);
        orders::insert_order_items(order.id, &items, &mut tx).await?;
        for item in &items {
            products::reserve_or_fail(&item.product_id, item.quantity, &mut tx).await?;
            trace!("🗃️ Reserved {} × {} for order [{}]", item.quantity, item.product_id, order.order_id);
        }
        if let Some(code) = discount_code {
            discounts::increment_usage(&code, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn settle_payment(
        &self,
        reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<SettlementResult, FulfillmentError> {
        use OrderStatusType::*;
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::fetch_order_by_payment_reference(reference, &mut tx).await? else {
            info!("🗃️ No order carries payment reference {reference}. Nothing to settle.");
            return Ok(SettlementResult::UnknownReference);
        };
        trace!("🗃️ Settling payment: order [{}] is currently {}", order.order_id, order.status);
        let result = match outcome {
            PaymentOutcome::Succeeded => {
                if matches!(order.status, Pending | Failed) {
                    let updated = orders::update_order_status(order.id, Processing, &mut tx).await?;
                    debug!("🗃️ Payment {reference} settled. Order [{}] is now Processing.", updated.order_id);
                    SettlementResult::Settled(updated)
                } else {
                    debug!(
                        "🗃️ Payment {reference} reports success but order [{}] is already {}. No action to take.",
                        order.order_id, order.status
                    );
                    SettlementResult::NoChange(order)
                }
            },
            PaymentOutcome::Failed => {
                if matches!(order.status, Failed | Cancelled) {
                    debug!(
                        "🗃️ Payment {reference} reports failure but order [{}] is already {}. No action to take.",
                        order.order_id, order.status
                    );
                    SettlementResult::NoChange(order)
                } else {
                    let updated = orders::update_order_status(order.id, Failed, &mut tx).await?;
                    let items = orders::fetch_order_items(order.id, &mut tx).await?;
                    products::release_items(&items, &mut tx).await?;
                    debug!(
                        "🗃️ Payment {reference} failed. Order [{}] marked Failed and {} line item reservations \
                         released.",
                        updated.order_id,
                        items.len()
                    );
                    SettlementResult::Settled(updated)
                }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn cancel_order(
        &self,
        order_id: &OrderId,
        requesting_customer: Option<&str>,
    ) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, false, &mut tx)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.clone()))?;
        if let Some(customer_id) = requesting_customer {
            // A foreign order reads as absent, so callers cannot probe for other customers' orders.
            if order.customer_id != customer_id {
                debug!("🗃️ Customer {customer_id} asked to cancel order [{order_id}], which is not theirs");
                return Err(FulfillmentError::OrderNotFound(order_id.clone()));
            }
        }
        if !order.status.is_cancellable() {
            return Err(FulfillmentError::InvalidStateChange { order_id: order_id.clone(), status: order.status });
        }
        let updated = orders::update_order_status(order.id, OrderStatusType::Cancelled, &mut tx).await?;
        let items = orders::fetch_order_items(order.id, &mut tx).await?;
        products::release_items(&items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{order_id}] cancelled. {} line item reservations released.", items.len());
        Ok(updated)
    }

    async fn cancel_stale_orders(&self, max_age: Duration) -> Result<Vec<Order>, FulfillmentError> {
        let stale = {
            let mut conn = self.pool.acquire().await?;
            orders::fetch_stale_pending_orders(max_age, &mut conn).await?
        };
        let mut cancelled = Vec::with_capacity(stale.len());
        for order in stale {
            match self.cancel_stale_order(&order).await {
                Ok(Some(order)) => cancelled.push(order),
                Ok(None) => {},
                Err(e) => warn!("🗃️ Could not cancel stale order [{}]: {e}", order.order_id),
            }
        }
        Ok(cancelled)
    }

    async fn fetch_active_discount(&self, code: &str) -> Result<Option<Discount>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let discount = discounts::fetch_active_discount(code, &mut conn).await?;
        Ok(discount)
    }

    async fn record_webhook_event(&self, event_id: &str, event_type: &str) -> Result<bool, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let first_delivery = webhook_events::record_event(event_id, event_type, &mut conn).await?;
        Ok(first_delivery)
    }

    async fn close(&mut self) -> Result<(), FulfillmentError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(
        &self,
        order_id: &OrderId,
        include_deleted: bool,
    ) -> Result<Option<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, include_deleted, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, id: i64) -> Result<Vec<OrderItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn set_order_delete_flag(&self, order_id: &OrderId, deleted: bool) -> Result<Order, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_delete_flag(order_id, deleted, &mut conn).await
    }

    async fn mark_order_shipped(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, false, &mut tx)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.clone()))?;
        match orders::mark_shipped(order.id, &mut tx).await? {
            Some(updated) => {
                tx.commit().await?;
                debug!("🗃️ Order [{order_id}] marked as shipped");
                Ok(updated)
            },
            None => Err(FulfillmentError::InvalidStateChange { order_id: order_id.clone(), status: order.status }),
        }
    }

    async fn mark_order_delivered(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, false, &mut tx)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.clone()))?;
        match orders::mark_delivered(order.id, &mut tx).await? {
            Some(updated) => {
                tx.commit().await?;
                debug!("🗃️ Order [{order_id}] marked as delivered");
                Ok(updated)
            },
            None => Err(FulfillmentError::InvalidStateChange { order_id: order_id.clone(), status: order.status }),
        }
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(product_id, false, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product_any(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(product_id, true, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self, include_deleted: bool) -> Result<Vec<Product>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(include_deleted, &mut conn).await?;
        Ok(products)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("📦️ Product [{}] added to the catalogue", product.id);
        Ok(product)
    }

    async fn available(&self, product_id: &str) -> Result<i64, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::available(product_id, &mut conn)
            .await?
            .ok_or_else(|| FulfillmentError::ProductNotFound(product_id.to_string()))
    }

    async fn reserve(&self, product_id: &str, quantity: i64) -> Result<(), FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::reserve_or_fail(product_id, quantity, &mut conn).await
    }

    async fn release(&self, product_id: &str, quantity: i64) -> Result<(), FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        if !products::release(product_id, quantity, &mut conn).await? {
            warn!("📦️ Release for unknown product {product_id} ignored");
        }
        Ok(())
    }

    async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<Product, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::adjust_stock(product_id, delta, &mut conn)
            .await?
            .ok_or_else(|| FulfillmentError::ProductNotFound(product_id.to_string()))
    }

    async fn set_product_delete_flag(&self, product_id: &str, deleted: bool) -> Result<Product, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::set_delete_flag(product_id, deleted, &mut conn)
            .await?
            .ok_or_else(|| FulfillmentError::ProductNotFound(product_id.to_string()))
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cancels a single stale order in its own transaction. The `Pending` status is re-checked inside the
    /// transaction, so an order settled by a webhook mid-sweep is left alone and its inventory is touched exactly
    /// once. Returns `None` in that case.
    async fn cancel_stale_order(&self, order: &Order) -> Result<Option<Order>, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let current =
            orders::fetch_order_by_id(order.id, &mut tx).await?.ok_or(FulfillmentError::OrderIdNotFound(order.id))?;
        if current.status != OrderStatusType::Pending {
            debug!("🗃️ Order [{}] was settled while the sweep was running. Leaving it alone.", current.order_id);
            return Ok(None);
        }
        let updated = orders::update_order_status(order.id, OrderStatusType::Cancelled, &mut tx).await?;
        let items = orders::fetch_order_items(order.id, &mut tx).await?;
        products::release_items(&items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Stale order [{}] cancelled. {} line item reservations released.", updated.order_id, items.len());
        Ok(Some(updated))
    }
}
