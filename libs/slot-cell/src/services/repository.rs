use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Timelike};
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::DataEnvelope;
use shared_utils::SessionContext;

use crate::error::SlotError;
use crate::models::{DateRange, RawTherapist, RawTimeSlot, Therapist, TherapistId, TimeSlot};
use crate::services::directory::SlotDirectory;

const TIME_SLOTS_PATH: &str = "/api/time-slots";

pub struct SlotRepositoryClient {
    api: Arc<ApiClient>,
    session: SessionContext,
    default_session_fee: f64,
}

impl SlotRepositoryClient {
    pub fn new(config: &AppConfig, session: SessionContext) -> Self {
        Self {
            api: Arc::new(ApiClient::new(config)),
            session,
            default_session_fee: config.default_session_fee,
        }
    }

    pub fn with_client(api: Arc<ApiClient>, session: SessionContext, default_session_fee: f64) -> Self {
        Self {
            api,
            session,
            default_session_fee,
        }
    }

    /// Normalised slots for the range, in backend order.
    pub async fn fetch_slots(&self, range: DateRange) -> Result<Vec<TimeSlot>, SlotError> {
        let raw = self.fetch_raw(range).await?;
        raw.into_iter()
            .map(|r| normalize_slot(&r))
            .collect()
    }

    /// Slots for the range grouped by therapist.
    pub async fn fetch_directory(&self, range: DateRange) -> Result<SlotDirectory, SlotError> {
        let raw = self.fetch_raw(range).await?;
        let directory = group_by_therapist(raw, self.default_session_fee)?;
        info!(
            "Loaded {} therapists with slots between {} and {}",
            directory.len(),
            range.start,
            range.end
        );
        Ok(directory)
    }

    #[instrument(skip(self))]
    async fn fetch_raw(&self, range: DateRange) -> Result<Vec<RawTimeSlot>, SlotError> {
        if !range.is_valid() {
            return Err(SlotError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }

        // no token, no request
        let session = self.session.current().ok_or(SlotError::AuthMissing)?;

        let start = range.start.format("%Y-%m-%d").to_string();
        let end = range.end.format("%Y-%m-%d").to_string();
        let query = [("start_date", start.as_str()), ("end_date", end.as_str())];

        let envelope: DataEnvelope<Vec<RawTimeSlot>> = self
            .api
            .request_with_query(Method::GET, TIME_SLOTS_PATH, Some(session.bearer()), &query)
            .await
            .map_err(|e| {
                warn!("Time slot fetch failed: {}", e);
                SlotError::from(e)
            })?;

        debug!("Fetched {} raw slots", envelope.data.len());
        Ok(envelope.data)
    }
}

/// Accepts `H:MM`, `HH:MM`, `HH:MM:SS` and `HH:MM:SS.fff`; seconds are dropped.
pub fn normalize_time(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    let parsed = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| format!("invalid time '{}'", raw))?;

    parsed
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .ok_or_else(|| format!("invalid time '{}'", raw))
}

/// Accepts `YYYY-MM-DD` or an ISO timestamp; only the calendar part is kept.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| format!("invalid date '{}'", raw))
}

fn normalize_slot(raw: &RawTimeSlot) -> Result<TimeSlot, SlotError> {
    let malformed = |reason: String| SlotError::MalformedPayload(format!("slot {}: {}", raw.id, reason));

    let therapist_id = raw
        .therapist_id
        .or_else(|| raw.therapist.as_ref().map(|t| t.id))
        .ok_or_else(|| malformed("missing therapist id".to_string()))?;

    let start_time = normalize_time(&raw.start_time).map_err(malformed)?;
    let end_time = normalize_time(&raw.end_time).map_err(malformed)?;
    let date = normalize_date(&raw.date).map_err(malformed)?;

    Ok(TimeSlot {
        id: raw.id,
        therapist_id,
        date,
        start_time,
        end_time,
        is_booked: raw.is_booked,
    })
}

fn seed_therapist(therapist_id: TherapistId, raw: Option<&RawTherapist>, default_fee: f64) -> Therapist {
    let name = raw
        .and_then(|t| t.name.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Therapist #{}", therapist_id));
    let specialization = raw
        .and_then(|t| t.specialization.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "General Counselling".to_string());
    let experience = raw.and_then(|t| t.experience).unwrap_or(0);

    let bio = raw
        .and_then(|t| t.bio.clone())
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| synthesize_bio(&name, &specialization, experience));

    Therapist {
        id: therapist_id,
        session_fee: raw.and_then(|t| t.session_fee).unwrap_or(default_fee),
        email: raw.and_then(|t| t.email.clone()),
        phone: raw.and_then(|t| t.phone.clone()),
        image: raw.and_then(|t| t.image.clone()),
        name,
        specialization,
        experience,
        bio,
    }
}

fn synthesize_bio(name: &str, specialization: &str, experience: i32) -> String {
    match experience {
        0 => format!("{} offers {} sessions.", name, specialization),
        1 => format!("{} specializes in {} with 1 year of experience.", name, specialization),
        years => format!(
            "{} specializes in {} with {} years of experience.",
            name, specialization, years
        ),
    }
}

/// Groups slots by therapist. The first slot seen for a therapist seeds its record.
pub fn group_by_therapist(raw: Vec<RawTimeSlot>, default_fee: f64) -> Result<SlotDirectory, SlotError> {
    let mut directory = SlotDirectory::new();

    for raw_slot in &raw {
        let slot = normalize_slot(raw_slot)?;
        directory
            .entry_with(slot.therapist_id, || {
                seed_therapist(slot.therapist_id, raw_slot.therapist.as_ref(), default_fee)
            })
            .slots
            .push(slot);
    }

    directory.sort_slots();
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawTimeSlot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_time_variants() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(normalize_time("09:00").unwrap(), nine);
        assert_eq!(normalize_time("9:00").unwrap(), nine);
        assert_eq!(normalize_time("09:00:59").unwrap(), nine);
        assert_eq!(normalize_time(" 09:00:00.000 ").unwrap(), nine);
        assert!(normalize_time("25:00").is_err());
        assert!(normalize_time("nine").is_err());
        assert!(normalize_time("09").is_err());
    }

    #[test]
    fn test_normalize_time_rejects_trailing_garbage() {
        assert!(normalize_time("10:30 PM").is_err());
        assert!(normalize_time("09:00abc").is_err());
        assert!(normalize_time("09:0012").is_err());
        assert!(normalize_time("09:00:00 UTC").is_err());
        assert!(normalize_time("09:60").is_err());
    }

    #[test]
    fn test_normalize_date_variants() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert_eq!(normalize_date("2026-10-20").unwrap(), day);
        assert_eq!(normalize_date("2026-10-20T00:00:00.000Z").unwrap(), day);
        assert!(normalize_date("20/10/2026").is_err());
    }

    #[test]
    fn test_first_occurrence_seeds_therapist() {
        let slots = vec![
            raw(json!({
                "id": 1, "therapist_id": 7, "date": "2026-10-20",
                "start_time": "10:00:00", "end_time": "11:00:00", "is_booked": false,
                "therapist": { "id": 7, "name": "Dr. Wanjiru", "specialization": "Trauma", "experience": 8 }
            })),
            raw(json!({
                "id": 2, "therapist_id": 7, "date": "2026-10-20",
                "start_time": "09:00:00", "end_time": "10:00:00", "is_booked": true,
                "therapist": { "id": 7, "name": "Someone Else", "session_fee": 9000.0 }
            })),
        ];

        let directory = group_by_therapist(slots, 5000.0).unwrap();
        let therapist = directory.therapist(7).unwrap();
        assert_eq!(therapist.name, "Dr. Wanjiru");
        assert_eq!(therapist.session_fee, 5000.0);
        assert_eq!(therapist.bio, "Dr. Wanjiru specializes in Trauma with 8 years of experience.");

        let schedule = directory.schedule(7).unwrap();
        assert_eq!(schedule.slots.len(), 2);
        assert_eq!(schedule.slots[0].id, 2);
        assert_eq!(schedule.slots[0].start_label(), "09:00");
    }

    #[test]
    fn test_backend_fee_and_bio_win() {
        let slots = vec![raw(json!({
            "id": 1, "therapist_id": 3, "date": "2026-10-20",
            "start_time": "10:00", "end_time": "11:00",
            "therapist": { "id": 3, "name": "A", "session_fee": 3500.0, "bio": "Hello" }
        }))];

        let directory = group_by_therapist(slots, 5000.0).unwrap();
        let therapist = directory.therapist(3).unwrap();
        assert_eq!(therapist.session_fee, 3500.0);
        assert_eq!(therapist.bio, "Hello");
    }

    #[test]
    fn test_slot_without_embedded_therapist() {
        let slots = vec![raw(json!({
            "id": 1, "therapist_id": 4, "date": "2026-10-20",
            "start_time": "10:00", "end_time": "11:00"
        }))];

        let directory = group_by_therapist(slots, 5000.0).unwrap();
        let therapist = directory.therapist(4).unwrap();
        assert_eq!(therapist.name, "Therapist #4");
        assert_eq!(therapist.bio, "Therapist #4 offers General Counselling sessions.");
    }

    #[test]
    fn test_malformed_slot_rejects_payload() {
        let slots = vec![raw(json!({
            "id": 9, "therapist_id": 4, "date": "2026-10-20",
            "start_time": "late", "end_time": "11:00"
        }))];

        assert_matches!(
            group_by_therapist(slots, 5000.0),
            Err(SlotError::MalformedPayload(msg)) if msg.contains("slot 9")
        );
    }

    #[test]
    fn test_missing_therapist_id_rejects_payload() {
        let slots = vec![raw(json!({
            "id": 9, "date": "2026-10-20", "start_time": "10:00", "end_time": "11:00"
        }))];

        assert_matches!(group_by_therapist(slots, 5000.0), Err(SlotError::MalformedPayload(_)));
    }
}
