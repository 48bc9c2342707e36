use thiserror::Error;

/// User-facing error taxonomy. Every error in the client maps onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    AuthMissing,
    NetworkOrServer,
    SlotConflict,
    ValidationMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Authentication required: please log in")]
    AuthMissing,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        details: Option<String>,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::AuthMissing => ErrorCategory::AuthMissing,
            AppError::Validation(_) => ErrorCategory::ValidationMissing,
            AppError::Conflict { .. } => ErrorCategory::SlotConflict,
            AppError::Api { .. } | AppError::Network(_) | AppError::MalformedResponse(_) => {
                ErrorCategory::NetworkOrServer
            }
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self.category() {
            ErrorCategory::AuthMissing => Some(Redirect::Login),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Conflict { .. } => Some(409),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict { .. })
    }
}
