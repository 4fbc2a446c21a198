//! Webhook signature middleware for Actix Web.
//!
//! The payment gateway signs every webhook delivery with HMAC-SHA256 over `"{timestamp}.{body}"` and sends the
//! result in the `X-Payment-Signature` header as `t=<unix ts>,v1=<hex hmac>`. This middleware verifies that
//! signature against the shared webhook secret before the request body reaches any handler, and enforces a
//! tolerance window on the timestamp so that a captured delivery cannot be replayed later.
//!
//! Wrap the payment webhook resource with this middleware. Requests with a missing, malformed, stale or mismatched
//! signature are rejected with a 400. When no webhook secret is configured, every request is rejected with a 503
//! rather than being waved through unsigned.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorServiceUnavailable},
    web,
    Error,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use sfs_common::Secret;
use stripe_tools::helpers::verify_signature;

pub const PAYMENT_SIGNATURE_HEADER: &str = "X-Payment-Signature";

pub struct SignatureMiddlewareFactory {
    secret: Secret<String>,
    tolerance_seconds: i64,
}

impl SignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>, tolerance_seconds: i64) -> Self {
        SignatureMiddlewareFactory { secret, tolerance_seconds }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService {
            secret: self.secret.clone(),
            tolerance_seconds: self.tolerance_seconds,
            service: Rc::new(service),
        }))
    }
}

pub struct SignatureMiddlewareService<S> {
    secret: Secret<String>,
    tolerance_seconds: i64,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let tolerance = self.tolerance_seconds;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            if secret.trim().is_empty() {
                warn!("🔐️ No webhook secret is configured. Refusing webhook delivery.");
                return Err(ErrorServiceUnavailable("The payment webhook is not configured."));
            }
            let header = req
                .headers()
                .get(PAYMENT_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    warn!("🔐️ No signature found in webhook request. Denying access.");
                    ErrorBadRequest("No webhook signature found.")
                })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let now = Utc::now().timestamp();
            match verify_signature(&secret, &header, data.as_ref(), tolerance, now) {
                Ok(()) => {
                    trace!("🔐️ Webhook signature check ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Invalid webhook signature. Denying access. {e}");
                    Err(ErrorBadRequest("Invalid webhook signature."))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
