use chrono::Duration;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType},
    engine_api::OrderQueryFilter,
    traits::FulfillmentError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, FulfillmentError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                status,
                currency,
                subtotal,
                discount_code,
                discount_kind,
                discount_value,
                discount_amount,
                shipping_cost,
                tax_amount,
                total_price,
                payment_reference,
                shipping_address,
                billing_address,
                is_gift,
                gift_message,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.customer_id)
    .bind(order.status.to_string())
    .bind(order.currency)
    .bind(order.subtotal)
    .bind(order.discount_code)
    .bind(order.discount_kind)
    .bind(order.discount_value)
    .bind(order.discount_amount)
    .bind(order.shipping_cost)
    .bind(order.tax_amount)
    .bind(order.total_price)
    .bind(order.payment_reference)
    .bind(order.shipping_address)
    .bind(order.billing_address)
    .bind(order.is_gift)
    .bind(order.gift_message)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Inserts the line items for the order with internal id `order_pk`. Call inside the same transaction as
/// [`insert_order`].
pub async fn insert_order_items(
    order_pk: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, FulfillmentError> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
        )
        .bind(order_pk)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *conn)
        .await?;
        result.push(row);
    }
    trace!("📝️ {} line items inserted for order id {order_pk}", result.len());
    Ok(result)
}

/// Returns the entry in the orders table for the corresponding `order_id`
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    include_deleted: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let q = if include_deleted {
        "SELECT * FROM orders WHERE order_id = $1"
    } else {
        "SELECT * FROM orders WHERE order_id = $1 AND is_deleted = 0"
    };
    let order = sqlx::query_as(q).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order carrying the given payment reference, whether soft-deleted or not.
pub async fn fetch_order_by_payment_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Returns the order with the given internal id, whether soft-deleted or not.
pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the line items for the order with the given internal id.
pub async fn fetch_order_items(order_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_pk)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Checks whether the order with the given `OrderId` already exists in the database. If it does exist, the `id` of
/// the order is returned. If it does not exist, `None` is returned.
pub async fn order_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<i64>, FulfillmentError> {
    let order = fetch_order_by_order_id(order_id, true, conn).await?;
    Ok(order.map(|o| o.id))
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at`, most recent first
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() || !query.include_deleted {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if !query.include_deleted {
        where_clause.push("is_deleted = 0");
    }
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.to_string());
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(reference) = query.payment_reference {
        where_clause.push("payment_reference = ");
        where_clause.push_bind_unseparated(reference);
    }
    if let Some(currency) = query.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfillmentError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(FulfillmentError::OrderIdNotFound(id))
}

/// Transitions the order to `Shipped` and stamps the shipment date, but only while the order is still `Processing`.
/// Returns `None` if the gate did not pass, whether because the order is in another status or does not exist.
pub(crate) async fn mark_shipped(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query_as(
        "UPDATE orders SET status = 'Shipped', shipped_date = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND status = 'Processing' RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Transitions the order to `Delivered`, but only while the order is `Shipped`. Returns `None` if the gate did not
/// pass.
pub(crate) async fn mark_delivered(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let result = sqlx::query_as(
        "UPDATE orders SET status = 'Delivered', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Shipped' \
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

pub(crate) async fn set_delete_flag(
    order_id: &OrderId,
    deleted: bool,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfillmentError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET is_deleted = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *")
            .bind(deleted)
            .bind(order_id.as_str())
            .fetch_optional(conn)
            .await?;
    debug!("📝️ Order [{order_id}] soft-delete flag set to {deleted}");
    result.ok_or_else(|| FulfillmentError::OrderNotFound(order_id.clone()))
}

/// Returns `Pending` orders that were created more than `max_age` ago. The rows are a snapshot; callers must
/// re-check the status inside the transaction that acts on each order.
pub(crate) async fn fetch_stale_pending_orders(
    max_age: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query_as(
        format!(
            "SELECT * FROM orders WHERE status = 'Pending' AND (unixepoch(CURRENT_TIMESTAMP) - \
             unixepoch(created_at)) > {}",
            max_age.num_seconds()
        )
        .as_str(),
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
