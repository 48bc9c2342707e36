// libs/booking-cell/src/services/views.rs
use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::UserRole;
use shared_utils::SessionContext;

use crate::error::BookingError;
use crate::models::{Booking, BookingStatus};
use crate::services::booking::BookingService;

/// Read-mostly views over the caller's bookings.
pub struct AppointmentViews {
    bookings: BookingService,
    session: SessionContext,
}

impl AppointmentViews {
    pub fn new(config: &AppConfig, session: SessionContext) -> Self {
        Self {
            bookings: BookingService::new(config, session.clone()),
            session,
        }
    }

    pub fn with_service(bookings: BookingService, session: SessionContext) -> Self {
        Self { bookings, session }
    }

    /// Bookings that belong to the logged-in user.
    ///
    /// Therapists see bookings made with them, patients see bookings they
    /// made and admins see everything.
    pub async fn my_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        let session = self.session.require()?;
        let user_id = session.user_id();

        let bookings: Vec<Booking> = match session.user.role {
            UserRole::Therapist => self
                .bookings
                .list_bookings(Some(user_id))
                .await?
                .into_iter()
                .filter(|b| b.therapist_id == user_id)
                .collect(),
            UserRole::Admin => self.bookings.list_bookings(None).await?,
            UserRole::Patient => self
                .bookings
                .list_bookings(None)
                .await?
                .into_iter()
                .filter(|b| b.user_id == user_id)
                .collect(),
        };

        Ok(bookings)
    }

    pub async fn upcoming(&self) -> Result<Vec<Booking>, BookingError> {
        self.upcoming_at(Local::now().naive_local()).await
    }

    /// Non-cancelled bookings whose slot has not started, soonest first.
    pub async fn upcoming_at(&self, now: NaiveDateTime) -> Result<Vec<Booking>, BookingError> {
        let mut upcoming: Vec<Booking> = self
            .my_bookings()
            .await?
            .into_iter()
            .filter(|b| b.is_upcoming(now))
            .collect();

        upcoming.sort_by_key(|b| b.slot.as_ref().map(|s| s.starts_at()));
        Ok(upcoming)
    }

    pub async fn cancel(&self, booking: &Booking) -> Result<Booking, BookingError> {
        self.change_status(booking, BookingStatus::Cancelled).await
    }

    pub async fn confirm(&self, booking: &Booking) -> Result<Booking, BookingError> {
        self.change_status(booking, BookingStatus::Confirmed).await
    }

    async fn change_status(&self, booking: &Booking, target: BookingStatus) -> Result<Booking, BookingError> {
        if !booking.booking_status.can_transition_to(&target) {
            warn!(
                "Rejected status change for booking {}: {} -> {}",
                booking.id, booking.booking_status, target
            );
            return Err(BookingError::InvalidStatusTransition {
                from: booking.booking_status,
                to: target,
            });
        }

        self.bookings.update_status(booking.id, target).await?;
        info!("Booking {} is now {}", booking.id, target);

        let mut updated = booking.clone();
        updated.booking_status = target;
        Ok(updated)
    }
}
