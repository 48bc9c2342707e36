// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::{AppError, SuccessEnvelope};
use shared_utils::SessionContext;
use slot_cell::TherapistId;

use crate::error::BookingError;
use crate::models::{Booking, BookingId, BookingStatus, CreateBookingRequest, CreatedBooking, UpdateBookingStatusRequest};

const BOOKINGS_PATH: &str = "/api/bookings";

/// Thin wrapper over the `/api/bookings` endpoints.
#[derive(Clone)]
pub struct BookingService {
    api: Arc<ApiClient>,
    session: SessionContext,
}

impl BookingService {
    pub fn new(config: &AppConfig, session: SessionContext) -> Self {
        Self {
            api: Arc::new(ApiClient::new(config)),
            session,
        }
    }

    pub fn with_client(api: Arc<ApiClient>, session: SessionContext) -> Self {
        Self { api, session }
    }

    /// Creates a booking and returns the server-assigned id.
    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<BookingId, BookingError> {
        let session = self.session.require()?;
        info!(
            "Creating booking for user {} with therapist {} (slot {})",
            request.user_id, request.therapist_id, request.slot_id
        );

        let body = serde_json::to_value(request).map_err(|e| BookingError::Validation(e.to_string()))?;

        let envelope: SuccessEnvelope<CreatedBooking> = self
            .api
            .request(Method::POST, BOOKINGS_PATH, Some(session.bearer()), Some(body))
            .await
            .map_err(|e| match e {
                AppError::Conflict { message, details } => {
                    warn!("Slot {} was taken before submission: {}", request.slot_id, message);
                    BookingError::SlotConflict {
                        slot_id: request.slot_id,
                        message: details.unwrap_or(message),
                    }
                }
                other => BookingError::from(other),
            })?;

        let booking_id = envelope
            .into_result("server reported failure")
            .map_err(BookingError::Rejected)?
            .and_then(|created| created.id)
            .ok_or(BookingError::MissingBookingId)?;

        info!("Booking {} created", booking_id);
        Ok(booking_id)
    }

    /// All bookings visible to the caller, optionally narrowed to one therapist.
    pub async fn list_bookings(&self, therapist_id: Option<TherapistId>) -> Result<Vec<Booking>, BookingError> {
        let session = self.session.require()?;

        let envelope: SuccessEnvelope<Vec<Booking>> = match therapist_id {
            Some(id) => {
                let query = [("therapistId", id.to_string())];
                self.api
                    .request_with_query(Method::GET, BOOKINGS_PATH, Some(session.bearer()), &query)
                    .await?
            }
            None => {
                self.api
                    .request(Method::GET, BOOKINGS_PATH, Some(session.bearer()), None)
                    .await?
            }
        };

        let bookings = envelope
            .into_result("failed to load bookings")
            .map_err(BookingError::Rejected)?
            .unwrap_or_default();
        debug!("Loaded {} bookings", bookings.len());
        Ok(bookings)
    }

    pub async fn update_status(&self, booking_id: BookingId, status: BookingStatus) -> Result<(), BookingError> {
        let session = self.session.require()?;
        let body = serde_json::to_value(UpdateBookingStatusRequest { booking_status: status })
            .map_err(|e| BookingError::Validation(e.to_string()))?;

        self.api
            .request_no_content(
                Method::PATCH,
                &format!("{}/{}", BOOKINGS_PATH, booking_id),
                Some(session.bearer()),
                Some(body),
            )
            .await?;

        info!("Booking {} moved to {}", booking_id, status);
        Ok(())
    }

    pub async fn delete_booking(&self, booking_id: BookingId) -> Result<(), BookingError> {
        let session = self.session.require()?;

        self.api
            .request_no_content(
                Method::DELETE,
                &format!("{}/{}", BOOKINGS_PATH, booking_id),
                Some(session.bearer()),
                None,
            )
            .await?;

        info!("Booking {} deleted", booking_id);
        Ok(())
    }
}
