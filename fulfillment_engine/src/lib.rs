//! Storefront Fulfillment Engine
//!
//! The fulfillment engine contains the core logic for the storefront's order backend: pricing and placing orders,
//! holding inventory reservations against them, reconciling the payment gateway's asynchronous verdicts, and sweeping
//! up orders whose payment never arrived. It is web-framework agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). Sqlite is the only supported backend at present. You should
//!    never need to access the database directly. Instead, use the public API provided by the engine. The exception
//!    is the data types used in the database. These are defined in the [`mod@db_types`] module and are public.
//! 2. The engine public API ([`mod@engine_api`]). This provides the public-facing functionality of the engine: the
//!    order lifecycle ([`OrderFlowApi`]), order queries and administration ([`OrderQueryApi`]) and the product
//!    catalogue ([`ProductApi`]). Specific backends need to implement the traits in [`mod@traits`] in order to act as
//!    a backend for the fulfillment server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when a new order is placed, an [`events::OrderCreatedEvent`] is emitted.
//! A simple actor framework is used so that you can easily hook into these events and perform custom actions.
pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use engine_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    orders_api::OrderQueryApi,
    products_api::ProductApi,
};
