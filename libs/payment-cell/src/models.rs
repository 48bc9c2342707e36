use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booking_cell::BookingId;
use slot_cell::{TherapistSummary, TimeSlot};

pub type PaymentId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    MobileMoney { phone: String },
    /// Shown to the user but not wired to a provider.
    Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentState {
    Idle,
    Submitting,
    Processing {
        checkout_request_id: String,
        merchant_request_id: Option<String>,
    },
    Failed(String),
}

impl PaymentState {
    pub fn is_processing(&self) -> bool {
        matches!(self, PaymentState::Processing { .. })
    }
}

/// Body of `POST /api/mpesa/initiate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub phone_number: String,
    pub amount: i64,
    pub reference_code: String,
    pub description: String,
    pub booking_id: BookingId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiationResponse {
    pub message: Option<String>,
    #[serde(rename = "checkoutRequestID", alias = "CheckoutRequestID")]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "merchantRequestID", alias = "MerchantRequestID")]
    pub merchant_request_id: Option<String>,
    pub error: Option<String>,
}

/// Carried to the confirmation view once the redirect fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationDetails {
    pub booking_id: BookingId,
    pub checkout_request_id: String,
    pub merchant_request_id: Option<String>,
    pub therapist: TherapistSummary,
    pub session_fee: f64,
    pub slot: TimeSlot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    #[serde(alias = "pending", alias = "PENDING")]
    Pending,
    #[serde(alias = "completed", alias = "COMPLETED", alias = "success", alias = "Success")]
    Completed,
    #[serde(alias = "failed", alias = "FAILED")]
    Failed,
    #[serde(alias = "cancelled", alias = "CANCELLED")]
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A payment record as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub amount: f64,
    pub phone_number: Option<String>,
    pub checkout_request_id: Option<String>,
    pub merchant_request_id: Option<String>,
    pub status: PaymentStatus,
    pub mpesa_receipt_number: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
