mod signature;

pub use signature::{SignatureMiddlewareFactory, PAYMENT_SIGNATURE_HEADER};
