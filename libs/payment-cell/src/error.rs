use thiserror::Error;

use shared_models::{AppError, ErrorCategory, Redirect};

pub const GENERIC_PAYMENT_FAILURE: &str = "Payment initiation failed. Please try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("Authentication required: please log in")]
    AuthMissing,

    #[error("Please enter a valid phone number (e.g. 0712345678)")]
    InvalidPhone(String),

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(f64),

    #[error("Card payments are not available yet. Please use M-Pesa")]
    MethodUnavailable,

    #[error("A payment is already being processed")]
    AlreadyProcessing,

    #[error("{0}")]
    Rejected(String),

    #[error("Redirect to confirmation was cancelled")]
    RedirectCancelled,

    #[error(transparent)]
    Api(AppError),
}

impl PaymentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PaymentError::AuthMissing => ErrorCategory::AuthMissing,
            PaymentError::InvalidPhone(_)
            | PaymentError::InvalidAmount(_)
            | PaymentError::MethodUnavailable
            | PaymentError::AlreadyProcessing => ErrorCategory::ValidationMissing,
            PaymentError::Rejected(_) | PaymentError::RedirectCancelled => ErrorCategory::NetworkOrServer,
            PaymentError::Api(e) => e.category(),
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self.category() {
            ErrorCategory::AuthMissing => Some(Redirect::Login),
            _ => None,
        }
    }
}

impl From<AppError> for PaymentError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::AuthMissing => PaymentError::AuthMissing,
            other => PaymentError::Api(other),
        }
    }
}
