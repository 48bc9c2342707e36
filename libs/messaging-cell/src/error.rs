use thiserror::Error;

use shared_models::{AppError, ErrorCategory, Redirect};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessagingError {
    #[error("Authentication required: please log in")]
    AuthMissing,

    #[error(transparent)]
    Api(AppError),
}

impl MessagingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MessagingError::AuthMissing => ErrorCategory::AuthMissing,
            MessagingError::Api(e) => e.category(),
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            MessagingError::AuthMissing => Some(Redirect::Login),
            MessagingError::Api(e) => e.redirect(),
        }
    }
}

impl From<AppError> for MessagingError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::AuthMissing => MessagingError::AuthMissing,
            other => MessagingError::Api(other),
        }
    }
}
