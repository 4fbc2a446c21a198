//! # Order pricing
//!
//! Every amount in the engine is an integer number of minor currency units (cents), held in a
//! [`Money`]. Rates are integers too, expressed in basis points (hundredths of a percent), so a
//! 10% discount is stored as `1000` and an 8% tax rate as `800`. Keeping everything integral means
//! two servers pricing the same cart always agree to the cent.
//!
//! A quote is built in four steps:
//!
//! 1. `subtotal` is the sum of `unit_price * quantity` over the line items.
//! 2. `discount_amount` is `subtotal * value / 10000` for percentage discounts, or the fixed value
//!    itself, clamped to the subtotal so the discounted amount can never go negative.
//! 3. `tax_amount` is taken on the discounted subtotal. Shipping is not taxed.
//! 4. `total_price = subtotal - discount_amount + shipping_cost + tax_amount`.
//!
//! All rate multiplications round half-up on the last cent.
//!
//! Orders quoted in a currency other than the base currency convert each monetary field
//! independently at the prevailing rate. The converted fields are what get persisted, so a total
//! can differ from the recomputed sum of its converted parts by a cent. The stored total is
//! authoritative.

use sfs_common::{Money, MoneyConversionError};

use crate::db_types::{DiscountKind, NewOrderItem};

pub const DEFAULT_SHIPPING_FEE: i64 = 500;
pub const DEFAULT_TAX_RATE_BP: i64 = 800;

/// The pricing parameters for a storefront. Constructed once at startup and shared by every
/// checkout.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Flat shipping fee added to every order, in minor units of the base currency.
    pub shipping_fee: Money,
    /// Tax rate in basis points, applied to the discounted subtotal.
    pub tax_rate_bp: i64,
    /// The currency the catalogue is priced in.
    pub base_currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            shipping_fee: Money::from(DEFAULT_SHIPPING_FEE),
            tax_rate_bp: DEFAULT_TAX_RATE_BP,
            base_currency: sfs_common::BASE_CURRENCY_CODE.to_string(),
        }
    }
}

/// The priced breakdown of an order, in minor units of a single currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub shipping_cost: Money,
    pub tax_amount: Money,
    pub total_price: Money,
}

impl Quote {
    /// Re-expresses every field of the quote in another currency at the given rate. Each field is
    /// converted independently.
    pub fn convert(&self, rate: f64) -> Result<Quote, MoneyConversionError> {
        Ok(Quote {
            subtotal: self.subtotal.convert(rate)?,
            discount_amount: self.discount_amount.convert(rate)?,
            shipping_cost: self.shipping_cost.convert(rate)?,
            tax_amount: self.tax_amount.convert(rate)?,
            total_price: self.total_price.convert(rate)?,
        })
    }
}

/// Multiplies `amount` by a rate given in basis points, rounding half-up on the last cent.
pub fn basis_points(amount: Money, bp: i64) -> Money {
    Money::from((amount.value() * bp + 5_000) / 10_000)
}

/// Prices a cart. `discount` is the kind and value of an applicable discount, already validated;
/// percentage values are in basis points and fixed values in minor units.
pub fn quote(items: &[NewOrderItem], discount: Option<(DiscountKind, Money)>, config: &PricingConfig) -> Quote {
    let subtotal = items.iter().map(NewOrderItem::line_total).sum::<Money>();
    let discount_amount = match discount {
        Some((DiscountKind::Percentage, value)) => basis_points(subtotal, value.value()),
        Some((DiscountKind::Fixed, value)) => value.min(subtotal),
        None => Money::default(),
    };
    let taxable = subtotal - discount_amount;
    let tax_amount = basis_points(taxable, config.tax_rate_bp);
    let total_price = taxable + config.shipping_fee + tax_amount;
    Quote { subtotal, discount_amount, shipping_cost: config.shipping_fee, tax_amount, total_price }
}
