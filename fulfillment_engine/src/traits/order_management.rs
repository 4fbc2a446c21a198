use crate::{
    db_types::{Order, OrderId, OrderItem},
    engine_api::OrderQueryFilter,
    traits::FulfillmentError,
};

/// Read access and simple record-level updates for orders. The transactional flows (creation, settlement,
/// cancellation) live on [`FulfillmentDatabase`](crate::traits::FulfillmentDatabase).
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given order id. Soft-deleted orders are only returned when `include_deleted` is
    /// set.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId, include_deleted: bool) -> Result<Option<Order>, FulfillmentError>;

    /// Fetches the order carrying the given payment reference, including soft-deleted orders.
    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, FulfillmentError>;

    /// Fetches the line items for the order with the given internal id.
    async fn fetch_order_items(&self, id: i64) -> Result<Vec<OrderItem>, FulfillmentError>;

    /// Returns all orders matching the filter, most recent first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, FulfillmentError>;

    /// Sets or clears the soft-delete flag on an order. Returns the updated order.
    async fn set_order_delete_flag(&self, order_id: &OrderId, deleted: bool) -> Result<Order, FulfillmentError>;

    /// Marks a `Processing` order as shipped, stamping the shipment date. Orders in any other status fail with
    /// [`FulfillmentError::InvalidStateChange`].
    async fn mark_order_shipped(&self, order_id: &OrderId) -> Result<Order, FulfillmentError>;

    /// Marks a `Shipped` order as delivered. Orders in any other status fail with
    /// [`FulfillmentError::InvalidStateChange`].
    async fn mark_order_delivered(&self, order_id: &OrderId) -> Result<Order, FulfillmentError>;
}
