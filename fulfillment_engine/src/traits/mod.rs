//! # Storage and collaborator contracts.
//!
//! This module defines the interface contracts that fulfillment engine *backends* and external collaborators must
//! implement.
//!
//! ## Orders and inventory
//! An order is created together with its line items, and every line item places a provisional hold (a reservation)
//! on its product's stock. Reservations are released when payment fails or the order is cancelled, and never go
//! negative.
//!
//! ## Traits
//! * [`FulfillmentDatabase`] defines the highest level of behaviour for backends: the transactional order, payment
//!   settlement and cancellation flows.
//! * [`OrderManagement`] provides methods for querying and administering orders (lookups, filtered search, soft
//!   delete, shipment updates).
//! * [`InventoryManagement`] provides the stock reservation primitives and product administration.
//! * [`PaymentProcessor`] is the outbound payment gateway contract (synchronous authorization).
//! * [`ExchangeRates`] is the currency rate provider contract.
mod data_objects;
mod exchange_rates;
mod fulfillment_database;
mod inventory_management;
mod order_management;
mod payment_processor;

pub use data_objects::SettlementResult;
pub use exchange_rates::{ExchangeRateError, ExchangeRates};
pub use fulfillment_database::{FulfillmentDatabase, FulfillmentError};
pub use inventory_management::InventoryManagement;
pub use order_management::OrderManagement;
pub use payment_processor::{AuthorizationRequest, PaymentAuthorization, PaymentProcessor, PaymentProcessorError};
