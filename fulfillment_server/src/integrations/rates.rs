//! A static, configuration-driven exchange rate table.
//!
//! Rates are supplied through `SFS_EXCHANGE_RATES` as a comma-separated list of `from:to=rate` entries, for example
//! `usd:eur=0.93,usd:gbp=0.79`. The table never refreshes at runtime. Repricing means restarting the server, which
//! is how the storefront wants it: a quote and its authorization must not straddle a rate change.

use std::{collections::HashMap, env, sync::Arc};

use fulfillment_engine::traits::{ExchangeRateError, ExchangeRates};
use log::*;

#[derive(Clone, Debug, Default)]
pub struct ConfiguredRates {
    rates: Arc<HashMap<(String, String), f64>>,
}

impl ConfiguredRates {
    pub fn new(rates: HashMap<(String, String), f64>) -> Self {
        Self { rates: Arc::new(rates) }
    }

    pub fn from_env() -> Self {
        let spec = env::var("SFS_EXCHANGE_RATES").unwrap_or_else(|_| {
            info!("🪛️ SFS_EXCHANGE_RATES is not set. Only base-currency orders will be accepted.");
            String::default()
        });
        Self::new(parse_rate_table(&spec))
    }
}

fn parse_rate_table(spec: &str) -> HashMap<(String, String), f64> {
    let mut rates = HashMap::new();
    for entry in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parsed = entry.split_once('=').and_then(|(pair, rate)| {
            let (from, to) = pair.split_once(':')?;
            let rate = rate.trim().parse::<f64>().ok().filter(|r| r.is_finite() && *r > 0.0)?;
            Some(((from.trim().to_lowercase(), to.trim().to_lowercase()), rate))
        });
        match parsed {
            Some((pair, rate)) => {
                rates.insert(pair, rate);
            },
            None => warn!("🪛️ Ignoring malformed SFS_EXCHANGE_RATES entry: {entry}"),
        }
    }
    rates
}

impl ExchangeRates for ConfiguredRates {
    async fn rate(&self, from: &str, to: &str) -> Result<f64, ExchangeRateError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(1.0);
        }
        self.rates
            .get(&(from.to_lowercase(), to.to_lowercase()))
            .copied()
            .ok_or_else(|| ExchangeRateError::RateDoesNotExist(format!("{from}:{to}")))
    }
}
