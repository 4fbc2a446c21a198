pub mod rates;
pub mod stripe;

pub use rates::ConfiguredRates;
pub use stripe::StripeGateway;
