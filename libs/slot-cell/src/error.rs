use chrono::NaiveDate;
use thiserror::Error;

use shared_models::{AppError, ErrorCategory, Redirect};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("Authentication required: please log in")]
    AuthMissing,

    #[error("Failed to fetch time slots")]
    FetchFailed { status: u16 },

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    MalformedPayload(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl SlotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SlotError::AuthMissing => ErrorCategory::AuthMissing,
            SlotError::InvalidRange { .. } => ErrorCategory::ValidationMissing,
            _ => ErrorCategory::NetworkOrServer,
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            SlotError::AuthMissing => Some(Redirect::Login),
            _ => None,
        }
    }
}

impl From<AppError> for SlotError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::AuthMissing => SlotError::AuthMissing,
            AppError::Api { .. } | AppError::Conflict { .. } => SlotError::FetchFailed {
                status: err.status().unwrap_or_default(),
            },
            AppError::Network(message) | AppError::Validation(message) => SlotError::Network(message),
            AppError::MalformedResponse(message) => SlotError::MalformedPayload(message),
        }
    }
}
