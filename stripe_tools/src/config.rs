use log::*;
use sfs_common::Secret;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeApiConfig {
    /// Base URL of the Stripe REST API. Overridable so tests can point the client at a local stub.
    pub api_base: String,
    pub secret_key: Secret<String>,
    /// Shared secret for the `t=<ts>,v1=<hmac>` signatures on inbound webhook events.
    pub webhook_secret: Secret<String>,
    /// Client-side timeout for outbound gateway calls, in seconds. A timed-out authorization is a gateway error;
    /// no order is created for it.
    pub timeout_seconds: u64,
    /// Maximum age of a webhook signature timestamp before the event is rejected as stale.
    pub signature_tolerance_seconds: i64,
}

impl Default for StripeApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            signature_tolerance_seconds: DEFAULT_SIGNATURE_TOLERANCE_SECONDS,
        }
    }
}

impl StripeApiConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_base = std::env::var("SFS_STRIPE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let secret_key = Secret::new(std::env::var("SFS_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SFS_STRIPE_SECRET_KEY is not set. Checkout payment authorizations will be refused.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("SFS_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SFS_STRIPE_WEBHOOK_SECRET is not set. Inbound payment webhooks will be refused.");
            String::default()
        }));
        let timeout_seconds = std::env::var("SFS_STRIPE_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for SFS_STRIPE_TIMEOUT: {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        let signature_tolerance_seconds = std::env::var("SFS_STRIPE_SIGNATURE_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid value for SFS_STRIPE_SIGNATURE_TOLERANCE: {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_SIGNATURE_TOLERANCE_SECONDS);
        Self { api_base, secret_key, webhook_secret, timeout_seconds, signature_tolerance_seconds }
    }

    /// True when a secret key has been supplied. The client refuses to send requests without one rather than
    /// collecting guaranteed 401s from the gateway.
    pub fn has_secret_key(&self) -> bool {
        !self.secret_key.reveal().trim().is_empty()
    }

    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.reveal().trim().is_empty()
    }
}
