//! Unified API for querying and administering orders.

use std::fmt::Debug;

use crate::{
    db_types::{Order, OrderId},
    engine_api::order_objects::{OrderQueryFilter, OrderWithItems},
    traits::{FulfillmentError, OrderManagement},
};

/// The `OrderQueryApi` provides a unified API for order lookups, filtered searches and record-level administration.
/// It does not move orders through the payment lifecycle; that is
/// [`OrderFlowApi`](crate::engine_api::order_flow_api::OrderFlowApi)'s job.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi ({:?})", self.db)
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the order with the given order id. If no order exists, `None` is returned.
    pub async fn fetch_order(
        &self,
        order_id: &OrderId,
        include_deleted: bool,
    ) -> Result<Option<Order>, FulfillmentError> {
        self.db.fetch_order_by_order_id(order_id, include_deleted).await
    }

    /// Fetches an order together with its line items.
    pub async fn fetch_order_with_items(
        &self,
        order_id: &OrderId,
        include_deleted: bool,
    ) -> Result<Option<OrderWithItems>, FulfillmentError> {
        match self.db.fetch_order_by_order_id(order_id, include_deleted).await? {
            Some(order) => {
                let items = self.db.fetch_order_items(order.id).await?;
                Ok(Some(OrderWithItems { order, items }))
            },
            None => Ok(None),
        }
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, FulfillmentError> {
        self.db.search_orders(query).await
    }

    /// Soft-deletes an order. The record stays in the database and remains reachable with `include_deleted` set.
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        self.db.set_order_delete_flag(order_id, true).await
    }

    /// Clears the soft-delete flag on an order.
    pub async fn restore_order(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        self.db.set_order_delete_flag(order_id, false).await
    }

    /// Marks a `Processing` order as shipped.
    pub async fn mark_shipped(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        self.db.mark_order_shipped(order_id).await
    }

    /// Marks a `Shipped` order as delivered.
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<Order, FulfillmentError> {
        self.db.mark_order_delivered(order_id).await
    }
}
