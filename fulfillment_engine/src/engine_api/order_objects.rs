use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{
    de,
    de::{SeqAccess, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
};
use sfs_common::BASE_CURRENCY_CODE;

use crate::db_types::{Order, OrderId, OrderItem, OrderStatusType};

/// A checkout submission. Addresses arrive fully resolved; address book lookups belong to the storefront that sits
/// in front of this engine.
///
/// When `payment_method` is present the gateway confirms the charge during checkout and the order starts out
/// `Processing`. Without it the order starts out `Pending` and waits for the gateway's webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub items: Vec<CartItem>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub shipping_address: String,
    pub billing_address: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub is_gift: bool,
    #[serde(default)]
    pub gift_message: Option<String>,
}

fn default_currency() -> String {
    BASE_CURRENCY_CODE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

/// An order with its line items, as returned to storefront clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_id: Option<String>,
    pub payment_reference: Option<String>,
    pub currency: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Accepts a sequence in JSON, or a comma-separated scalar (`status=Pending,Processing`) in a query string,
    /// since query-string deserialization cannot carry sequences.
    #[serde(default, deserialize_with = "status_filter")]
    pub status: Option<Vec<OrderStatusType>>,
    /// Soft-deleted orders are excluded unless this is set. It is a view mode, not a search criterion, so it does
    /// not count towards [`OrderQueryFilter::is_empty`].
    #[serde(default)]
    pub include_deleted: bool,
}

fn status_filter<'de, D>(deserializer: D) -> Result<Option<Vec<OrderStatusType>>, D::Error>
where D: Deserializer<'de> {
    struct StatusFilter;

    impl<'de> Visitor<'de> for StatusFilter {
        type Value = Vec<OrderStatusType>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a comma-separated list of order statuses, or a sequence of them")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<OrderStatusType>().map_err(de::Error::custom))
                .collect()
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut statuses = Vec::new();
            while let Some(status) = seq.next_element::<OrderStatusType>()? {
                statuses.push(status);
            }
            Ok(statuses)
        }
    }

    deserializer.deserialize_any(StatusFilter).map(Some)
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_payment_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_id.is_none() &&
            self.payment_reference.is_none() &&
            self.currency.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(reference) = &self.payment_reference {
            write!(f, "payment_reference: {reference}. ")?;
        }
        if let Some(currency) = &self.currency {
            write!(f, "currency: {currency}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if self.include_deleted {
            write!(f, "including deleted. ")?;
        }
        Ok(())
    }
}
