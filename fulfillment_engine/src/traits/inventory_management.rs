use crate::{
    db_types::{NewProduct, Product},
    traits::FulfillmentError,
};

/// Access to the product catalogue and its reservation counters.
///
/// `reserve` and `release` are the only mutators of the `reserved` column outside of the transactional flows on
/// [`FulfillmentDatabase`](crate::traits::FulfillmentDatabase), and both are single conditional statements so they
/// stay correct under concurrent use.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Fetches an active (not soft-deleted) product by its id.
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError>;

    /// Fetches a product by its id regardless of its soft-delete flag.
    async fn fetch_product_any(&self, product_id: &str) -> Result<Option<Product>, FulfillmentError>;

    /// Returns the product catalogue, ordered by name. Soft-deleted products are only included when
    /// `include_deleted` is set.
    async fn fetch_products(&self, include_deleted: bool) -> Result<Vec<Product>, FulfillmentError>;

    /// Adds a new product to the catalogue.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, FulfillmentError>;

    /// Returns the number of units of the product available for new orders, `stock - reserved`.
    async fn available(&self, product_id: &str) -> Result<i64, FulfillmentError>;

    /// Atomically reserves `quantity` units of the product. The update only fires while
    /// `stock - reserved >= quantity` holds, so two concurrent reservations cannot oversell;
    /// the loser fails with [`FulfillmentError::InsufficientStock`].
    async fn reserve(&self, product_id: &str, quantity: i64) -> Result<(), FulfillmentError>;

    /// Releases `quantity` units of the product, flooring the reservation counter at zero. Unknown products are
    /// logged and skipped, a release must never fail a cancellation that is already underway.
    async fn release(&self, product_id: &str, quantity: i64) -> Result<(), FulfillmentError>;

    /// Adjusts the physical stock level of a product by a (possibly negative) delta. Returns the updated product.
    async fn adjust_stock(&self, product_id: &str, delta: i64) -> Result<Product, FulfillmentError>;

    /// Sets or clears the soft-delete flag on a product. Soft-deleted products are invisible to checkout but keep
    /// their rows so historical orders can still resolve their line items.
    async fn set_product_delete_flag(&self, product_id: &str, deleted: bool) -> Result<Product, FulfillmentError>;
}
