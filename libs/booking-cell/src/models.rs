use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use slot_cell::{SlotId, TherapistId, TherapistSummary, TimeSlot};

pub type BookingId = i64;

// ==============================================================================
// BOOKINGS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "confirmed")]
    Confirmed,
    #[serde(alias = "cancelled", alias = "Canceled", alias = "canceled")]
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: &BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "Pending"),
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: i64,
    pub therapist_id: TherapistId,
    pub slot_id: SlotId,
    pub booking_status: BookingStatus,
    pub created_at: Option<DateTime<Utc>>,
    /// Present when the backend joins the slot into the listing.
    #[serde(default)]
    pub slot: Option<TimeSlot>,
}

impl Booking {
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        !self.booking_status.is_terminal()
            && self.slot.as_ref().map(|s| !s.is_past(now)).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateBookingRequest {
    pub user_id: i64,
    pub therapist_id: TherapistId,
    pub slot_id: SlotId,
    pub booking_status: BookingStatus,
}

/// `data` of a create response. Every field is optional so a missing id is
/// reported as such instead of as a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedBooking {
    pub id: Option<BookingId>,
    pub booking_status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub booking_status: BookingStatus,
}

// ==============================================================================
// BOOKING FLOW
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlowState {
    Browsing,
    TherapistExpanded,
    SlotSelected,
    Submitting,
    Submitted,
}

impl FlowState {
    /// `Submitted` is terminal; a new cycle starts from a date or range change.
    pub fn can_transition_to(&self, target: &FlowState) -> bool {
        use FlowState::*;
        match (self, target) {
            (Submitted, _) => false,
            (Submitting, Browsing) => false,
            (_, Browsing) => true,
            (_, TherapistExpanded) => true,
            (TherapistExpanded, SlotSelected) | (SlotSelected, SlotSelected) => true,
            (SlotSelected, Submitting) => true,
            (Submitting, Submitted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Browsing => "browsing",
            FlowState::TherapistExpanded => "therapist_expanded",
            FlowState::SlotSelected => "slot_selected",
            FlowState::Submitting => "submitting",
            FlowState::Submitted => "submitted",
        };
        write!(f, "{}", name)
    }
}

/// Ephemeral selection owned by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub date: NaiveDate,
    pub therapist: Option<TherapistId>,
    pub slot: Option<SlotId>,
}

impl SelectionState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            therapist: None,
            slot: None,
        }
    }
}

/// Transfer state handed to the payment step after a booking is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentHandoff {
    pub booking_id: BookingId,
    pub user_id: i64,
    pub therapist: TherapistSummary,
    pub session_fee: f64,
    pub slot: TimeSlot,
}
