//! The Stripe-backed payment processor.
//!
//! Adapts the [`StripeApi`] client to the engine's [`PaymentProcessor`] contract: the order total and currency go
//! out as a payment intent, and the intent id comes back as the payment reference stored against the order.

use fulfillment_engine::traits::{
    AuthorizationRequest,
    PaymentAuthorization,
    PaymentProcessor,
    PaymentProcessorError,
};
use log::*;
use stripe_tools::{StripeApi, StripeApiConfig, StripeApiError};

#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(config: StripeApiConfig) -> Result<Self, StripeApiError> {
        let api = StripeApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentProcessor for StripeGateway {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<PaymentAuthorization, PaymentProcessorError> {
        let intent = self
            .api
            .create_payment_intent(
                request.amount.value(),
                &request.currency,
                request.payment_method.as_deref(),
                request.order_id.as_str(),
            )
            .await
            .map_err(|e| match e {
                StripeApiError::CardDeclined(msg) => PaymentProcessorError::Declined(msg),
                StripeApiError::NotConfigured(msg) | StripeApiError::Initialization(msg) => {
                    PaymentProcessorError::Configuration(msg)
                },
                other => PaymentProcessorError::Gateway(other.to_string()),
            })?;
        debug!("💳️ Authorization for order {} opened with reference {}", request.order_id, intent.id);
        Ok(PaymentAuthorization { reference: intent.id })
    }
}
