//! # Fulfillment engine public API
//!
//! The `engine_api` module exposes the programmatic API for the fulfillment engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! A storefront server will typically hold an [`order_flow_api::OrderFlowApi`] for the checkout and webhook paths
//! and the read-side APIs for its query endpoints, but a reporting job might construct only an
//! [`orders_api::OrderQueryApi`].
//!
//! * [`order_flow_api`] is the primary API, handling checkout, payment reconciliation, cancellation, and the stale
//!   order sweep.
//! * [`orders_api`] provides read access to orders and their line items, plus the soft-delete toggles and shipment
//!   status updates.
//! * [`products_api`] provides read access to the catalogue and the stock adjustment and soft-delete operations.
//!
//! The other submodules in this module are support and utility functions and types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to create an API instance to query orders on the database:
//!
//! ```rust,ignore
//! use fulfillment_engine::{OrderQueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = OrderQueryApi::new(db);
//! // use the api to access information
//! let order = api.fetch_order(&order_id, false).await?;
//! ```

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;
pub mod products_api;

pub use order_objects::{CartItem, CheckoutRequest, OrderQueryFilter, OrderWithItems};
