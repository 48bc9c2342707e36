use thiserror::Error;

use shared_models::{AppError, ErrorCategory, Redirect};
use slot_cell::{SlotError, SlotId, TherapistId};

use crate::models::{BookingStatus, FlowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRejection {
    NoTherapistExpanded,
    UnknownSlot,
    WrongTherapist,
    WrongDate,
    Booked,
    InPast,
}

impl std::fmt::Display for SlotRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SlotRejection::NoTherapistExpanded => "select a therapist first",
            SlotRejection::UnknownSlot => "slot not found",
            SlotRejection::WrongTherapist => "slot belongs to another therapist",
            SlotRejection::WrongDate => "slot is not on the selected date",
            SlotRejection::Booked => "slot is already booked",
            SlotRejection::InPast => "slot has already started",
        };
        write!(f, "{}", reason)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Authentication required: please log in")]
    AuthMissing,

    #[error("Cannot select slot {slot_id}: {reason}")]
    SlotRejected { slot_id: SlotId, reason: SlotRejection },

    #[error("This slot has already been booked")]
    SlotConflict { slot_id: SlotId, message: String },

    #[error("Booking was created but the server returned no booking id")]
    MissingBookingId,

    #[error("Therapist {0} has no slots in the loaded range")]
    UnknownTherapist(TherapistId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Booking request rejected: {0}")]
    Rejected(String),

    #[error("Invalid flow transition from {from} to {to}")]
    InvalidTransition { from: FlowState, to: FlowState },

    #[error("Invalid booking status transition from {from} to {to}")]
    InvalidStatusTransition { from: BookingStatus, to: BookingStatus },

    #[error(transparent)]
    Api(AppError),

    #[error(transparent)]
    Slots(#[from] SlotError),
}

impl BookingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::AuthMissing => ErrorCategory::AuthMissing,
            BookingError::SlotConflict { .. } => ErrorCategory::SlotConflict,
            BookingError::SlotRejected { .. }
            | BookingError::UnknownTherapist(_)
            | BookingError::Validation(_)
            | BookingError::InvalidTransition { .. }
            | BookingError::InvalidStatusTransition { .. } => ErrorCategory::ValidationMissing,
            BookingError::MissingBookingId | BookingError::Rejected(_) => ErrorCategory::NetworkOrServer,
            BookingError::Api(e) => e.category(),
            BookingError::Slots(e) => e.category(),
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self.category() {
            ErrorCategory::AuthMissing => Some(Redirect::Login),
            _ => None,
        }
    }
}

impl From<AppError> for BookingError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::AuthMissing => BookingError::AuthMissing,
            other => BookingError::Api(other),
        }
    }
}
