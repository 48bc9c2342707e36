// libs/booking-cell/src/services/orchestrator.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_utils::SessionContext;
use slot_cell::{DateRange, SlotDirectory, SlotId, SlotRepositoryClient, Therapist, TherapistId, TimeSlot};

use crate::error::{BookingError, SlotRejection};
use crate::models::{BookingId, BookingStatus, CreateBookingRequest, FlowState, PaymentHandoff, SelectionState};
use crate::services::booking::BookingService;

/// Drives one browse → select → submit cycle over a loaded date range.
///
/// The orchestrator owns the local slot cache and the current selection. All
/// mutation goes through `&mut self`, so a second submit cannot start while
/// one is in flight.
pub struct BookingOrchestrator {
    slots: SlotRepositoryClient,
    bookings: BookingService,
    session: SessionContext,
    range: DateRange,
    directory: SlotDirectory,
    selection: SelectionState,
    state: FlowState,
    booking_id: Option<BookingId>,
    // slots this client has seen taken; re-applied over every refresh
    known_booked: HashSet<SlotId>,
}

impl BookingOrchestrator {
    pub fn new(config: &AppConfig, session: SessionContext, range: DateRange) -> Self {
        let api = Arc::new(ApiClient::new(config));
        let slots = SlotRepositoryClient::with_client(Arc::clone(&api), session.clone(), config.default_session_fee);
        let bookings = BookingService::with_client(api, session.clone());
        Self::with_services(slots, bookings, session, range)
    }

    pub fn with_services(
        slots: SlotRepositoryClient,
        bookings: BookingService,
        session: SessionContext,
        range: DateRange,
    ) -> Self {
        Self {
            slots,
            bookings,
            session,
            range,
            directory: SlotDirectory::new(),
            selection: SelectionState::new(range.start),
            state: FlowState::Browsing,
            booking_id: None,
            known_booked: HashSet::new(),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn directory(&self) -> &SlotDirectory {
        &self.directory
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn booking_id(&self) -> Option<BookingId> {
        self.booking_id
    }

    pub fn expanded_therapist(&self) -> Option<&Therapist> {
        self.selection
            .therapist
            .and_then(|id| self.directory.therapist(id))
    }

    pub fn selected_slot(&self) -> Option<&TimeSlot> {
        self.selection.slot.and_then(|id| self.directory.slot(id))
    }

    /// Therapists with slots on the selected date.
    pub fn therapists_for_date(&self) -> Vec<&Therapist> {
        self.directory.therapists_on(self.selection.date)
    }

    /// Slots of the expanded therapist on the selected date, booked ones included.
    pub fn visible_slots(&self) -> Vec<&TimeSlot> {
        match self.selection.therapist {
            Some(id) => self.directory.slots_on(id, self.selection.date),
            None => Vec::new(),
        }
    }

    // ==========================================================================
    // LOADING
    // ==========================================================================

    /// Re-fetches the current range and reconciles the selection against it.
    #[instrument(skip(self), fields(start = %self.range.start, end = %self.range.end))]
    pub async fn refresh(&mut self) -> Result<(), BookingError> {
        let mut directory = self.slots.fetch_directory(self.range).await?;
        for slot_id in &self.known_booked {
            directory.mark_booked(*slot_id);
        }
        self.directory = directory;
        self.reconcile_selection()?;
        debug!("Slot cache refreshed with {} therapists", self.directory.len());
        Ok(())
    }

    /// Switches to a new range. The date is kept when it falls inside it.
    pub async fn load_range(&mut self, range: DateRange) -> Result<(), BookingError> {
        self.range = range;
        let date = if range.contains(self.selection.date) {
            self.selection.date
        } else {
            range.start
        };
        self.select_date(date);
        self.refresh().await
    }

    fn reconcile_selection(&mut self) -> Result<(), BookingError> {
        if self.state == FlowState::Submitted {
            return Ok(());
        }

        if let Some(slot_id) = self.selection.slot {
            let still_open = self
                .directory
                .slot(slot_id)
                .map(|slot| !slot.is_booked)
                .unwrap_or(false);
            if !still_open {
                debug!("Selected slot {} is no longer available", slot_id);
                self.transition(FlowState::TherapistExpanded)?;
                self.selection.slot = None;
            }
        }

        if let Some(therapist_id) = self.selection.therapist {
            if self.directory.therapist(therapist_id).is_none() {
                self.transition(FlowState::Browsing)?;
                self.selection.therapist = None;
                self.selection.slot = None;
            }
        }
        Ok(())
    }

    // ==========================================================================
    // SELECTION
    // ==========================================================================

    /// Picking a date always drops the therapist and slot selection and
    /// starts a new cycle, including after a submitted booking.
    pub fn select_date(&mut self, date: NaiveDate) {
        if self.state != FlowState::Browsing {
            debug!("Booking flow {} -> {} (new date {})", self.state, FlowState::Browsing, date);
        }
        self.selection = SelectionState::new(date);
        self.booking_id = None;
        self.state = FlowState::Browsing;
    }

    /// Expands a therapist, or collapses them when already expanded.
    pub fn expand_therapist(&mut self, therapist_id: TherapistId) -> Result<(), BookingError> {
        if self.session.current().is_none() {
            warn!("Therapist expansion attempted without a session");
            return Err(BookingError::AuthMissing);
        }
        if self.directory.therapist(therapist_id).is_none() {
            return Err(BookingError::UnknownTherapist(therapist_id));
        }

        if self.selection.therapist == Some(therapist_id) {
            return self.collapse();
        }

        self.transition(FlowState::TherapistExpanded)?;
        self.selection.therapist = Some(therapist_id);
        self.selection.slot = None;
        self.booking_id = None;
        Ok(())
    }

    pub fn collapse(&mut self) -> Result<(), BookingError> {
        self.transition(FlowState::Browsing)?;
        self.selection.therapist = None;
        self.selection.slot = None;
        Ok(())
    }

    pub fn select_slot(&mut self, slot_id: SlotId) -> Result<(), BookingError> {
        self.select_slot_at(slot_id, Local::now().naive_local())
    }

    /// Selects a slot of the expanded therapist, judging "past" against `now`.
    pub fn select_slot_at(&mut self, slot_id: SlotId, now: NaiveDateTime) -> Result<(), BookingError> {
        let reject = |reason: SlotRejection| BookingError::SlotRejected { slot_id, reason };

        let therapist_id = self
            .selection
            .therapist
            .ok_or_else(|| reject(SlotRejection::NoTherapistExpanded))?;
        let slot = self
            .directory
            .slot(slot_id)
            .ok_or_else(|| reject(SlotRejection::UnknownSlot))?;

        if slot.therapist_id != therapist_id {
            return Err(reject(SlotRejection::WrongTherapist));
        }
        if slot.date != self.selection.date {
            return Err(reject(SlotRejection::WrongDate));
        }
        if slot.is_booked {
            return Err(reject(SlotRejection::Booked));
        }
        if slot.is_past(now) {
            return Err(reject(SlotRejection::InPast));
        }

        self.transition(FlowState::SlotSelected)?;
        self.selection.slot = Some(slot_id);
        Ok(())
    }

    pub fn clear_slot(&mut self) -> Result<(), BookingError> {
        if self.selection.slot.is_some() {
            self.transition(FlowState::TherapistExpanded)?;
            self.selection.slot = None;
        }
        Ok(())
    }

    // ==========================================================================
    // SUBMISSION
    // ==========================================================================

    pub async fn submit(&mut self) -> Result<PaymentHandoff, BookingError> {
        self.submit_at(Local::now().naive_local()).await
    }

    /// Creates the booking for the selected slot.
    ///
    /// On success the slot is marked booked locally and the payment hand-off is
    /// returned. On any failure the selection returns to the expanded therapist
    /// and the slot cache is re-fetched.
    #[instrument(skip(self, now))]
    pub async fn submit_at(&mut self, now: NaiveDateTime) -> Result<PaymentHandoff, BookingError> {
        if self.state != FlowState::SlotSelected {
            return Err(BookingError::Validation(
                "Please select a time slot before booking".to_string(),
            ));
        }

        let session = self.session.require()?;
        let therapist = self
            .expanded_therapist()
            .cloned()
            .ok_or_else(|| BookingError::Validation("Please select a therapist".to_string()))?;
        let slot = self
            .selected_slot()
            .cloned()
            .ok_or_else(|| BookingError::Validation("Please select a time slot".to_string()))?;

        if slot.is_booked || slot.is_past(now) {
            let reason = if slot.is_booked { SlotRejection::Booked } else { SlotRejection::InPast };
            self.clear_slot()?;
            return Err(BookingError::SlotRejected { slot_id: slot.id, reason });
        }

        self.transition(FlowState::Submitting)?;

        let request = CreateBookingRequest {
            user_id: session.user_id(),
            therapist_id: therapist.id,
            slot_id: slot.id,
            booking_status: BookingStatus::Pending,
        };

        match self.bookings.create_booking(&request).await {
            Ok(booking_id) => {
                self.known_booked.insert(slot.id);
                self.directory.mark_booked(slot.id);
                self.booking_id = Some(booking_id);
                self.transition(FlowState::Submitted)?;

                info!(
                    "Booking {} ready for payment ({} at {})",
                    booking_id, therapist.name, slot
                );

                let mut booked_slot = slot;
                booked_slot.is_booked = true;
                Ok(PaymentHandoff {
                    booking_id,
                    user_id: session.user_id(),
                    session_fee: therapist.session_fee,
                    therapist: therapist.summary(),
                    slot: booked_slot,
                })
            }
            Err(err) => {
                if let BookingError::SlotConflict { slot_id, .. } = &err {
                    self.known_booked.insert(*slot_id);
                    self.directory.mark_booked(*slot_id);
                }

                self.selection.slot = None;
                self.transition(FlowState::TherapistExpanded)?;

                if let Err(refresh_err) = self.refresh().await {
                    warn!("Slot refresh after failed booking also failed: {}", refresh_err);
                }
                Err(err)
            }
        }
    }

    fn transition(&mut self, to: FlowState) -> Result<(), BookingError> {
        if !self.state.can_transition_to(&to) {
            warn!("Rejected booking flow transition {} -> {}", self.state, to);
            return Err(BookingError::InvalidTransition { from: self.state, to });
        }
        if self.state != to {
            debug!("Booking flow {} -> {}", self.state, to);
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::test_utils::{TestConfig, TestUser};

    fn orchestrator(session: SessionContext) -> BookingOrchestrator {
        let config = TestConfig::default().to_app_config();
        let start = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        BookingOrchestrator::new(&config, session, DateRange::week_from(start))
    }

    #[test]
    fn test_starts_browsing_on_range_start() {
        let flow = orchestrator(SessionContext::in_memory(None));
        assert_eq!(flow.state(), FlowState::Browsing);
        assert_eq!(flow.selection().date, flow.range().start);
        assert!(flow.visible_slots().is_empty());
    }

    #[test]
    fn test_expand_without_session_is_rejected() {
        let mut flow = orchestrator(SessionContext::in_memory(None));
        assert_matches!(flow.expand_therapist(1), Err(BookingError::AuthMissing));
        assert_eq!(flow.state(), FlowState::Browsing);
    }

    #[test]
    fn test_expand_unknown_therapist() {
        let mut flow = orchestrator(TestUser::default().session_context("tok"));
        assert_matches!(flow.expand_therapist(7), Err(BookingError::UnknownTherapist(7)));
    }

    #[test]
    fn test_select_without_therapist() {
        let mut flow = orchestrator(TestUser::default().session_context("tok"));
        assert_matches!(
            flow.select_slot(1),
            Err(BookingError::SlotRejected { reason: SlotRejection::NoTherapistExpanded, .. })
        );
    }

    #[tokio::test]
    async fn test_submit_requires_selection() {
        let mut flow = orchestrator(TestUser::default().session_context("tok"));
        assert_matches!(flow.submit().await, Err(BookingError::Validation(_)));
        assert_eq!(flow.state(), FlowState::Browsing);
    }
}
