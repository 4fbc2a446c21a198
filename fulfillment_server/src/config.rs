use std::env;

use chrono::Duration;
use fulfillment_engine::helpers::{PricingConfig, DEFAULT_SHIPPING_FEE, DEFAULT_TAX_RATE_BP};
use log::*;
use sfs_common::{helpers::parse_boolean_flag, Money, Secret, BASE_CURRENCY_CODE};
use stripe_tools::StripeApiConfig;

const DEFAULT_SFS_HOST: &str = "127.0.0.1";
const DEFAULT_SFS_PORT: u16 = 8360;
const DEFAULT_PENDING_ORDER_TIMEOUT: Duration = Duration::minutes(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The time before a Pending order is considered abandoned and cancelled by the stale-order worker.
    pub pending_order_timeout: Duration,
    /// Static token required on shipment webhook calls. When empty, the shipment webhook refuses requests with 503.
    pub shipment_webhook_token: Secret<String>,
    /// Payment gateway configuration, including the webhook signing secret.
    pub stripe: StripeApiConfig,
    /// Shipping fee, tax rate and base currency used to price checkouts.
    pub pricing: PricingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFS_HOST.to_string(),
            port: DEFAULT_SFS_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            pending_order_timeout: DEFAULT_PENDING_ORDER_TIMEOUT,
            shipment_webhook_token: Secret::default(),
            stripe: StripeApiConfig::default(),
            pricing: PricingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFS_HOST").ok().unwrap_or_else(|| DEFAULT_SFS_HOST.into());
        let port = env::var("SFS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFS_PORT. {e} Using the default, {DEFAULT_SFS_PORT}, instead."
                    );
                    DEFAULT_SFS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFS_PORT);
        let database_url = env::var("SFS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SFS_DATABASE_URL is not set. Please set it to the URL for the fulfillment database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SFS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SFS_USE_FORWARDED").ok(), false);
        let pending_order_timeout = configure_pending_order_timeout();
        let shipment_webhook_token = Secret::new(env::var("SFS_SHIPMENT_WEBHOOK_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ SFS_SHIPMENT_WEBHOOK_TOKEN is not set. Inbound shipment webhooks will be refused.");
            String::default()
        }));
        let stripe = StripeApiConfig::new_from_env_or_default();
        let pricing = pricing_from_env();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            pending_order_timeout,
            shipment_webhook_token,
            stripe,
            pricing,
        }
    }
}

fn configure_pending_order_timeout() -> Duration {
    env::var("SFS_PENDING_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ SFS_PENDING_ORDER_TIMEOUT is not set. Using the default value of {} minutes.",
                DEFAULT_PENDING_ORDER_TIMEOUT.num_minutes()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::minutes)
                .map_err(|e| warn!("🪛️ Invalid configuration value for SFS_PENDING_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_PENDING_ORDER_TIMEOUT)
}

fn pricing_from_env() -> PricingConfig {
    let shipping_fee = env::var("SFS_SHIPPING_FEE")
        .ok()
        .and_then(|s| {
            s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid value for SFS_SHIPPING_FEE: {e}. Using the default.")).ok()
        })
        .map(Money::from)
        .unwrap_or_else(|| Money::from(DEFAULT_SHIPPING_FEE));
    let tax_rate_bp = env::var("SFS_TAX_RATE_BP")
        .ok()
        .and_then(|s| {
            s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid value for SFS_TAX_RATE_BP: {e}. Using the default.")).ok()
        })
        .unwrap_or(DEFAULT_TAX_RATE_BP);
    let base_currency =
        env::var("SFS_BASE_CURRENCY").map(|s| s.to_lowercase()).unwrap_or_else(|_| BASE_CURRENCY_CODE.to_string());
    PricingConfig { shipping_fee, tax_rate_bp, base_currency }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers need at request time. Generally we try to keep this as small
/// as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
