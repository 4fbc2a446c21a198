use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, OrderItem, Product},
    traits::FulfillmentError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, FulfillmentError> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(product.id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product_by_id(
    product_id: &str,
    include_deleted: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let q = if include_deleted {
        "SELECT * FROM products WHERE id = $1"
    } else {
        "SELECT * FROM products WHERE id = $1 AND is_deleted = 0"
    };
    let product = sqlx::query_as(q).bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products(include_deleted: bool, conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let q = if include_deleted {
        "SELECT * FROM products ORDER BY name"
    } else {
        "SELECT * FROM products WHERE is_deleted = 0 ORDER BY name"
    };
    let products = sqlx::query_as(q).fetch_all(conn).await?;
    Ok(products)
}

/// The number of units open to new reservations, `stock - reserved`. `None` if the product does not exist or has
/// been soft-deleted.
pub async fn available(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let available = sqlx::query_scalar("SELECT stock - reserved FROM products WHERE id = $1 AND is_deleted = 0")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(available)
}

/// Atomically reserves `quantity` units. The check and the increment are a single statement, so two concurrent
/// reservations cannot both pass a check that only one of them should. Returns `false` if the product is missing,
/// soft-deleted, or short of stock.
pub async fn reserve(product_id: &str, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET reserved = reserved + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND is_deleted = \
         0 AND stock - reserved >= $1",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Like [`reserve`], but reports the failure as a typed error, distinguishing a missing product from a stock
/// shortage.
pub async fn reserve_or_fail(
    product_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), FulfillmentError> {
    if reserve(product_id, quantity, &mut *conn).await? {
        return Ok(());
    }
    match fetch_product_by_id(product_id, false, conn).await? {
        Some(p) => Err(FulfillmentError::InsufficientStock {
            product_id: product_id.to_string(),
            requested: quantity,
            available: p.available(),
        }),
        None => Err(FulfillmentError::ProductNotFound(product_id.to_string())),
    }
}

/// Atomically releases `quantity` units, flooring the reservation counter at zero. Soft-deleted products are still
/// released so that cancelling an old order never strands its reservation. Returns `false` if no such product
/// exists.
pub async fn release(product_id: &str, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE products SET reserved = MAX(reserved - $1, 0), updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(quantity)
            .bind(product_id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}

/// Releases the reservations held by a set of line items. A product that has vanished from the catalogue is logged
/// and skipped; the release of the remaining items still goes ahead.
pub async fn release_items(items: &[OrderItem], conn: &mut SqliteConnection) -> Result<(), FulfillmentError> {
    for item in items {
        if !release(&item.product_id, item.quantity, &mut *conn).await? {
            warn!("📦️ Product {} no longer exists. Reservation release for {} units skipped.", item.product_id, item.quantity);
        }
    }
    Ok(())
}

pub(crate) async fn adjust_stock(
    product_id: &str,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(delta)
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
    Ok(product)
}

pub(crate) async fn set_delete_flag(
    product_id: &str,
    deleted: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("UPDATE products SET is_deleted = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(deleted)
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
    debug!("📦️ Product [{product_id}] soft-delete flag set to {deleted}");
    Ok(product)
}
