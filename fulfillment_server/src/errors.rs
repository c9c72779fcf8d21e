use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use fulfillment_engine::{FulfillmentError, OrderReadError};
use thiserror::Error;

use crate::data_objects::JsonResponse;

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
    #[error("Conflicting status change. {0}")]
    TransitionConflict(String),
    #[error("Unsupported status change. {0}")]
    UnsupportedTransition(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedTransition(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::TransitionConflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Failures use the same envelope as successes, so webhook automation can branch on `success` alone.
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(JsonResponse::failure(self))
    }
}

impl From<FulfillmentError> for ServerError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            FulfillmentError::OrderNotFound(n) => Self::NoRecordFound(format!("Order {n}")),
            FulfillmentError::OrderAlreadyExists(n) => Self::TransitionConflict(format!("Order {n} already exists")),
            FulfillmentError::TransitionRejected(e) => Self::TransitionConflict(e.to_string()),
            FulfillmentError::ConcurrentUpdate => Self::TransitionConflict(e.to_string()),
            FulfillmentError::Normalize(e) => Self::InvalidRequestBody(e.to_string()),
            FulfillmentError::ReadError(OrderReadError::OrderNotFound(n)) => Self::NoRecordFound(format!("Order {n}")),
            FulfillmentError::ReadError(OrderReadError::DatabaseError(e)) => {
                Self::BackendError(format!("Database error: {e}"))
            },
            FulfillmentError::UnsupportedAction(s) => Self::UnsupportedTransition(s),
        }
    }
}

impl From<OrderReadError> for ServerError {
    fn from(e: OrderReadError) -> Self {
        match e {
            OrderReadError::OrderNotFound(n) => Self::NoRecordFound(format!("Order {n}")),
            OrderReadError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
