use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of a cancellation request. When `customer_id` is given the cancellation is treated as a customer request
/// and the order must belong to that customer. Without it the cancellation is administrative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Body of an inbound shipment webhook call from the logistics provider.
///
/// Only the `Shipped` and `Delivered` statuses are accepted; the rest of the lifecycle belongs to the payment flow.
/// The provider's `shipped_date` is informational. The order is stamped with the time the transition was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentUpdate {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub shipped_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub product_id: String,
    pub available: i64,
}

/// View-mode query parameters for single-order fetches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeDeletedParams {
    #[serde(default)]
    pub include_deleted: bool,
}
