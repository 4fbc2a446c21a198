use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("The requested exchange rate does not exist: {0}")]
    RateDoesNotExist(String),
}

/// A source of currency conversion rates for quoting orders in currencies other than the base currency.
#[allow(async_fn_in_trait)]
pub trait ExchangeRates: Clone {
    /// Fetch the conversion rate from `from` to `to`, the factor a `from`-denominated amount is multiplied by to
    /// express it in `to`. If the pair is not supported, the error [`ExchangeRateError::RateDoesNotExist`] is
    /// returned.
    async fn rate(&self, from: &str, to: &str) -> Result<f64, ExchangeRateError>;
}
