mod pricing;

pub use pricing::{basis_points, quote, PricingConfig, Quote, DEFAULT_SHIPPING_FEE, DEFAULT_TAX_RATE_BP};
