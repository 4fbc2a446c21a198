//! # Storefront fulfillment server
//!
//! This module hosts the HTTP surface over the fulfillment engine. It is responsible for:
//! * the checkout endpoint that prices a cart and places an order,
//! * the order query, cancellation and soft-delete endpoints,
//! * the signature-protected webhook that receives payment outcomes from the gateway,
//! * the token-protected webhook that receives shipment updates,
//! * the background worker that sweeps up stale pending orders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod stale_order_worker;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
