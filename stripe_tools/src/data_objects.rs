use serde::{Deserialize, Serialize};

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// The subset of a Stripe payment intent that the fulfillment server cares about. `id` is the opaque reference
/// stored against the order; everything else is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// The envelope of an inbound webhook event: `{id, type, created, data: {object: {id, ...}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEventData {
    pub object: PaymentEventObject,
}

/// The object carried inside an event. Only the payment-intent id is needed to join the event back onto an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEventObject {
    pub id: String,
}

impl PaymentEvent {
    /// The payment reference the event pertains to.
    pub fn reference(&self) -> &str {
        &self.data.object.id
    }
}

/// The error body Stripe returns on non-2xx responses, `{"error": {"type": ..., "code": ..., "message": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
