mod money;

pub mod op;
mod secret;

pub mod helpers;

pub use money::{Money, MoneyConversionError, BASE_CURRENCY_CODE, MINOR_UNITS_PER_MAJOR};
pub use secret::Secret;
