use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use sfs_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
/// The public order identifier, as printed on invoices and returned to clients. Distinct from the db surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates a fresh order id. Uses 64 bits of randomness, which is plenty for a single storefront.
    pub fn random() -> Self {
        Self(format!("ord-{:016x}", rand::random::<u64>()))
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created, but payment has not been confirmed yet.
    Pending,
    /// Payment has been authorized or confirmed and the order is being prepared.
    Processing,
    /// The order has left the warehouse.
    Shipped,
    /// The order has been delivered to the customer.
    Delivered,
    /// The order has been cancelled by the customer, an admin, or the stale-order worker.
    Cancelled,
    /// The payment for this order failed.
    Failed,
}

impl OrderStatusType {
    /// Only unshipped, live orders may be cancelled. Everything else is terminal with respect to cancellation.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatusType::Pending | OrderStatusType::Processing)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Failed => write!(f, "Failed"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentOutcome     -------------------------------------------------------
/// The gateway's final word on a payment authorization, as delivered by webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

impl Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentOutcome::Succeeded => write!(f, "Succeeded"),
            PaymentOutcome::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub currency: String,
    pub subtotal: Money,
    pub discount_code: Option<String>,
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Money>,
    pub discount_amount: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_price: Money,
    pub payment_reference: Option<String>,
    pub shipping_address: String,
    pub billing_address: String,
    pub is_gift: bool,
    pub gift_message: Option<String>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    /// `Pending` for deferred payment, `Processing` once a synchronous authorization succeeded
    pub status: OrderStatusType,
    pub currency: String,
    pub subtotal: Money,
    pub discount_code: Option<String>,
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Money>,
    pub discount_amount: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_price: Money,
    /// The gateway's opaque authorization reference. Immutable once set; the webhook join key.
    pub payment_reference: Option<String>,
    pub shipping_address: String,
    pub billing_address: String,
    pub is_gift: bool,
    pub gift_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, customer_id: String, currency: String) -> Self {
        Self {
            order_id,
            customer_id,
            status: OrderStatusType::Pending,
            currency,
            subtotal: Money::default(),
            discount_code: None,
            discount_kind: None,
            discount_value: None,
            discount_amount: Money::default(),
            shipping_cost: Money::default(),
            tax_amount: Money::default(),
            total_price: Money::default(),
            payment_reference: None,
            shipping_address: String::default(),
            billing_address: String::default(),
            is_gift: false,
            gift_message: None,
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------      OrderItem        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Stable product identifier, used for all reservation arithmetic.
    pub product_id: String,
    /// Denormalized at creation time. Catalog renames must not alter historical orders.
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new<S1: Into<String>, S2: Into<String>>(product_id: S1, product_name: S2, quantity: i64, unit_price: Money) -> Self {
        Self { product_id: product_id.into(), product_name: product_name.into(), quantity, unit_price }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------       Product         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    /// Stable external identifier assigned by catalog management, not a db surrogate key.
    pub id: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub reserved: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn available(&self) -> i64 {
        self.stock - self.reserved
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, name: S2, price: Money, stock: i64) -> Self {
        Self { id: id.into(), name: name.into(), price, stock }
    }
}

//--------------------------------------      DiscountKind     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DiscountKind {
    /// `value` is a percentage in 2-decimal fixed point, e.g. 1000 is 10.00%
    Percentage,
    /// `value` is a flat amount in minor currency units
    Fixed,
}

impl Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountKind::Percentage => write!(f, "Percentage"),
            DiscountKind::Fixed => write!(f, "Fixed"),
        }
    }
}

impl From<String> for DiscountKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Percentage" => Self::Percentage,
            "Fixed" => Self::Fixed,
            _ => {
                error!("Invalid discount kind: {value}. But this conversion cannot fail. Defaulting to Fixed");
                Self::Fixed
            },
        }
    }
}

//--------------------------------------       Discount        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Discount {
    /// Stored upper-cased so that uniqueness holds regardless of input case.
    pub code: String,
    pub kind: DiscountKind,
    pub value: Money,
    pub times_used: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_status_round_trip() {
        for status in [
            OrderStatusType::Pending,
            OrderStatusType::Processing,
            OrderStatusType::Shipped,
            OrderStatusType::Delivered,
            OrderStatusType::Cancelled,
            OrderStatusType::Failed,
        ] {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("Misplaced".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn cancellable_states() {
        assert!(OrderStatusType::Pending.is_cancellable());
        assert!(OrderStatusType::Processing.is_cancellable());
        assert!(!OrderStatusType::Shipped.is_cancellable());
        assert!(!OrderStatusType::Delivered.is_cancellable());
        assert!(!OrderStatusType::Cancelled.is_cancellable());
        assert!(!OrderStatusType::Failed.is_cancellable());
    }

    #[test]
    fn order_ids_are_unique_enough() {
        let a = OrderId::random();
        let b = OrderId::random();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("ord-"));
    }
}
