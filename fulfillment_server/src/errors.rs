use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fulfillment_engine::{
    traits::{FulfillmentError, PaymentProcessorError},
    OrderFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request is invalid. {0}")]
    ValidationError(String),
    #[error("Insufficient stock. {0}")]
    InsufficientStock(String),
    #[error("The payment was declined. {0}")]
    PaymentDeclined(String),
    #[error("The payment gateway is unavailable. {0}")]
    PaymentGatewayError(String),
    #[error("The requested operation is not valid for the order's current status. {0}")]
    InvalidStateChange(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            Self::PaymentDeclined(_) => StatusCode::BAD_REQUEST,
            Self::InvalidStateChange(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::ConfigurationError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<FulfillmentError> for ServerError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::OrderNotFound(_) | FulfillmentError::OrderIdNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            FulfillmentError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            FulfillmentError::InsufficientStock { .. } => Self::InsufficientStock(e.to_string()),
            FulfillmentError::InvalidStateChange { .. } => Self::InvalidStateChange(e.to_string()),
            FulfillmentError::DiscountNotAvailable(_) => Self::ValidationError(e.to_string()),
            FulfillmentError::OrderAlreadyExists(_) | FulfillmentError::DatabaseError(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(s) => Self::ValidationError(s),
            OrderFlowError::Storage(e) => e.into(),
            OrderFlowError::Payment(PaymentProcessorError::Declined(s)) => Self::PaymentDeclined(s),
            OrderFlowError::Payment(PaymentProcessorError::Gateway(s)) => Self::PaymentGatewayError(s),
            OrderFlowError::Payment(PaymentProcessorError::Configuration(s)) => Self::ConfigurationError(s),
            // A missing conversion rate means the storefront cannot quote in the requested currency at all, which is
            // a configuration problem rather than a client one.
            OrderFlowError::CurrencyConversion(s) => Self::ConfigurationError(s),
        }
    }
}
