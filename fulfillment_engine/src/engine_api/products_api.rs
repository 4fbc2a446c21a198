//! Unified API for the product catalogue.

use std::fmt::Debug;

use crate::{
    db_types::{NewProduct, Product},
    traits::{FulfillmentError, InventoryManagement},
};

/// The `ProductApi` provides a unified API for catalogue administration and stock queries. Reservations are not made
/// here; they are a side effect of order placement and are released by cancellation and payment failure.
pub struct ProductApi<B> {
    db: B,
}

impl<B: Debug> Debug for ProductApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductApi ({:?})", self.db)
    }
}

impl<B> ProductApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches an active product by its id. If no active product exists, `None` is returned.
    pub async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError> {
        self.db.fetch_product(product_id).await
    }

    /// Fetches a product by its id, whether soft-deleted or not.
    pub async fn fetch_product_any(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError> {
        self.db.fetch_product_any(product_id).await
    }

    /// Returns the catalogue, ordered by name.
    pub async fn fetch_products(&self, include_deleted: bool) -> Result<Vec<Product>, FulfillmentError> {
        self.db.fetch_products(include_deleted).await
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product, FulfillmentError> {
        self.db.insert_product(product).await
    }

    /// Returns the number of units available for new orders, physical stock less active reservations.
    pub async fn available(&self, product_id: &str) -> Result<i64, FulfillmentError> {
        self.db.available(product_id).await
    }

    /// Adjusts the physical stock level by a (possibly negative) delta, for example after a stock take.
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<Product, FulfillmentError> {
        self.db.adjust_stock(product_id, delta).await
    }

    /// Soft-deletes a product, hiding it from checkout. Historical order items keep resolving against the row.
    pub async fn delete_product(&self, product_id: &str) -> Result<Product, FulfillmentError> {
        self.db.set_product_delete_flag(product_id, true).await
    }

    /// Restores a soft-deleted product to the catalogue.
    pub async fn restore_product(&self, product_id: &str) -> Result<Product, FulfillmentError> {
        self.db.set_product_delete_flag(product_id, false).await
    }
}
