use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeApiConfig,
    data_objects::{ApiErrorEnvelope, PaymentIntent},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeApiConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeApiConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut auth = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    /// Sends a form-encoded request and deserializes the JSON response. Card errors (HTTP 402 with a `card_error`
    /// body) are split out from other failures because they are a business outcome, not a gateway fault.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        if !form.is_empty() {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(&message) {
                if envelope.error.error_type == "card_error" {
                    return Err(StripeApiError::CardDeclined(envelope.error.message));
                }
            }
            Err(StripeApiError::QueryError { status, message })
        }
    }

    /// Creates a payment intent for `amount_minor` minor units of `currency`.
    ///
    /// With a `payment_method` the intent is confirmed in the same call, so a decline surfaces here as
    /// [`StripeApiError::CardDeclined`]. Without one, the intent is merely opened and the outcome arrives later on
    /// the webhook. Either way the returned intent id is the reference the webhook events will carry.
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        payment_method: Option<&str>,
        order_ref: &str,
    ) -> Result<PaymentIntent, StripeApiError> {
        if !self.config.has_secret_key() {
            return Err(StripeApiError::NotConfigured("no Stripe secret key is set".to_string()));
        }
        let mut form = vec![
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("metadata[order_id]", order_ref.to_string()),
        ];
        if let Some(pm) = payment_method {
            form.push(("payment_method", pm.to_string()));
            form.push(("confirmation_method", "manual".to_string()));
            form.push(("confirm", "true".to_string()));
        }
        // A fresh idempotency key per attempt; retry-on-duplicate semantics belong to the gateway.
        let idempotency_key = format!("sfs-{:032x}", rand::random::<u128>());
        debug!("Creating payment intent for order {order_ref}: {amount_minor} {currency}");
        let intent = self
            .rest_query::<PaymentIntent>(Method::POST, "/payment_intents", &form, Some(&idempotency_key))
            .await?;
        info!("Created payment intent {} for order {order_ref}", intent.id);
        Ok(intent)
    }
}
