//! # Stripe tools
//!
//! A thin client for the slice of the Stripe API that the fulfillment server uses: creating payment intents at
//! checkout, and building/verifying the signatures on the webhook events that deliver the asynchronous payment
//! outcomes. Everything else (refunds, captures, customer objects) is handled operationally and is not wrapped here.
mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;

pub use api::StripeApi;
pub use config::StripeApiConfig;
pub use data_objects::{PaymentEvent, PaymentEventObject, PaymentIntent, EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED};
pub use error::StripeApiError;
