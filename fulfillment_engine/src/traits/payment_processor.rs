use sfs_common::Money;
use thiserror::Error;

use crate::db_types::OrderId;

/// A charge request handed to the payment gateway at checkout. The amount is the order total in the order's
/// currency, in minor units.
///
/// When `payment_method` is given, the gateway confirms the charge synchronously and a decline surfaces here. When
/// it is absent the gateway only opens the authorization; the customer completes it out of band and the outcome
/// arrives later on the webhook.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub payment_method: Option<String>,
}

/// A successful authorization. The reference is the gateway's identifier for the charge and is stored against the
/// order so that asynchronous webhook events can find it again.
#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    pub reference: String,
}

/// Interface to the upstream payment gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentProcessor: Clone {
    /// Opens (and, if a payment method is attached, confirms) the authorization. Declines are a normal business
    /// outcome and are reported as [`PaymentProcessorError::Declined`]; transport and server failures on the gateway
    /// side are [`PaymentProcessorError::Gateway`].
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<PaymentAuthorization, PaymentProcessorError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentProcessorError {
    #[error("The payment was declined: {0}")]
    Declined(String),
    #[error("The payment gateway is unavailable: {0}")]
    Gateway(String),
    #[error("The payment gateway is not configured: {0}")]
    Configuration(String),
}
