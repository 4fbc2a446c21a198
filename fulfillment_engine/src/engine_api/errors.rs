use sfs_common::MoneyConversionError;
use thiserror::Error;

use crate::traits::{ExchangeRateError, FulfillmentError, PaymentProcessorError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("The checkout request is invalid: {0}")]
    ValidationError(String),
    #[error("Fulfillment storage error: {0}")]
    Storage(#[from] FulfillmentError),
    #[error("Payment processor error: {0}")]
    Payment(#[from] PaymentProcessorError),
    #[error("Currency conversion failed: {0}")]
    CurrencyConversion(String),
}

impl From<ExchangeRateError> for OrderFlowError {
    fn from(e: ExchangeRateError) -> Self {
        OrderFlowError::CurrencyConversion(e.to_string())
    }
}

impl From<MoneyConversionError> for OrderFlowError {
    fn from(e: MoneyConversionError) -> Self {
        OrderFlowError::CurrencyConversion(e.to_string())
    }
}
