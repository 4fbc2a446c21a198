use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Discount, NewOrder, NewOrderItem, Order, OrderId, OrderStatusType, PaymentOutcome},
    traits::{data_objects::SettlementResult, InventoryManagement, OrderManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the fulfillment engine.
///
/// Each method on this trait is a single atomic unit of work. The multi-step flows (order persistence with
/// reservations, payment settlement, cancellation) run inside one storage transaction so that a failure at any step
/// leaves no partial state behind.
#[allow(async_fn_in_trait)]
pub trait FulfillmentDatabase: Clone + OrderManagement + InventoryManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persists a priced order together with its line items, in a single atomic transaction:
    /// * the order row is inserted. If an order with the same order id already exists, the transaction is abandoned
    ///   with [`FulfillmentError::OrderAlreadyExists`].
    /// * every line item is inserted, and `reserved` on its product is atomically incremented by the item quantity.
    ///   The increment is conditional on `stock - reserved >= quantity` at the moment of the update, so concurrent
    ///   checkouts on the same product cannot both pass a check that a serialized execution would reject. A failed
    ///   reservation aborts with [`FulfillmentError::InsufficientStock`] and rolls everything back.
    /// * if the order carries a discount code, its `times_used` counter is incremented.
    ///
    /// Returns the persisted order.
    async fn insert_order_with_items(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Order, FulfillmentError>;

    /// Applies a payment outcome to the order with the given payment reference. Idempotent by construction: the
    /// transition is gated on the order's current status, so replaying the same outcome is a no-op.
    ///
    /// * Unknown reference: [`SettlementResult::UnknownReference`]. Not an error; the caller decides how to respond.
    /// * [`PaymentOutcome::Succeeded`]: `Pending` and `Failed` orders become `Processing`. Any other status is left
    ///   untouched. Inventory is never changed on success, reservation happened at creation time.
    /// * [`PaymentOutcome::Failed`]: orders already `Failed` or `Cancelled` are left untouched. Otherwise the order
    ///   becomes `Failed` and, in the same transaction, every line item's reservation is released (floored at zero).
    async fn settle_payment(&self, reference: &str, outcome: PaymentOutcome) -> Result<SettlementResult, FulfillmentError>;

    /// Cancels the order in a single atomic transaction: re-checks the status gate, sets the status to `Cancelled`
    /// and releases every line item's reservation.
    ///
    /// If `requesting_customer` is given, the order must belong to that customer; a mismatch reports
    /// [`FulfillmentError::OrderNotFound`] so that callers cannot distinguish foreign orders from absent ones.
    /// Orders that are not `Pending` or `Processing` fail with [`FulfillmentError::InvalidStateChange`].
    async fn cancel_order(&self, order_id: &OrderId, requesting_customer: Option<&str>) -> Result<Order, FulfillmentError>;

    /// Cancels every `Pending` order created more than `max_age` ago, releasing its reservations.
    ///
    /// Each order is cancelled in its own transaction, and the `Pending` status is re-checked inside that
    /// transaction, so a webhook settling the same order concurrently wins or loses deterministically and inventory
    /// is released exactly once. A failure on one order is logged and does not abort the rest of the batch.
    ///
    /// Returns the orders that were cancelled.
    async fn cancel_stale_orders(&self, max_age: Duration) -> Result<Vec<Order>, FulfillmentError>;

    /// Looks up an active discount code, case-insensitively. Inactive and unknown codes are both `None`.
    async fn fetch_active_discount(&self, code: &str) -> Result<Option<Discount>, FulfillmentError>;

    /// Records an inbound webhook event id. Returns `true` if this is the first time the event has been seen, and
    /// `false` for a redelivery.
    async fn record_webhook_event(&self, event_id: &str, event_type: &str) -> Result<bool, FulfillmentError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), FulfillmentError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, available {available}")]
    InsufficientStock { product_id: String, requested: i64, available: i64 },
    #[error("Order {order_id} cannot be modified while its status is {status}")]
    InvalidStateChange { order_id: OrderId, status: OrderStatusType },
    #[error("Discount code {0} is unknown or inactive")]
    DiscountNotAvailable(String),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        FulfillmentError::DatabaseError(e.to_string())
    }
}
