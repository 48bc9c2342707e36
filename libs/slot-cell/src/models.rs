use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub type TherapistId = i64;
pub type SlotId = i64;

// ==============================================================================
// THERAPISTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Therapist {
    pub id: TherapistId,
    pub name: String,
    pub specialization: String,
    pub experience: i32,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub session_fee: f64,
    pub bio: String,
    pub image: Option<String>,
}

impl Therapist {
    pub fn summary(&self) -> TherapistSummary {
        TherapistSummary {
            id: self.id,
            name: self.name.clone(),
            specialization: self.specialization.clone(),
            image: self.image.clone(),
        }
    }
}

/// The part of a therapist record carried from booking into payment and confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TherapistSummary {
    pub id: TherapistId,
    pub name: String,
    pub specialization: String,
    pub image: Option<String>,
}

// ==============================================================================
// TIME SLOTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub id: SlotId,
    pub therapist_id: TherapistId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

impl TimeSlot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// A slot starting exactly now is already past.
    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        self.starts_at() <= now
    }

    pub fn is_selectable(&self, now: NaiveDateTime) -> bool {
        !self.is_booked && !self.is_past(now)
    }

    pub fn start_label(&self) -> String {
        self.start_time.format("%H:%M").to_string()
    }

    pub fn end_label(&self) -> String {
        self.end_time.format("%H:%M").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date.format("%Y-%m-%d"),
            self.start_label(),
            self.end_label()
        )
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::services::repository::normalize_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Seven days starting at `start`, inclusive.
    pub fn week_from(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }
}

/// Rendering rules for slot dates. `day_offset` is display-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotDisplay {
    pub day_offset: i64,
}

impl SlotDisplay {
    pub fn new(day_offset: i64) -> Self {
        Self { day_offset }
    }

    /// Falls back to the raw date when the offset leaves the calendar range.
    pub fn display_date(&self, slot: &TimeSlot) -> NaiveDate {
        let days = Days::new(self.day_offset.unsigned_abs());
        let shifted = if self.day_offset >= 0 {
            slot.date.checked_add_days(days)
        } else {
            slot.date.checked_sub_days(days)
        };
        shifted.unwrap_or(slot.date)
    }

    pub fn format_slot(&self, slot: &TimeSlot) -> String {
        format!(
            "{}, {} - {}",
            self.display_date(slot).format("%a %d %b %Y"),
            slot.start_label(),
            slot.end_label()
        )
    }
}

// ==============================================================================
// WIRE SHAPES
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawTherapist {
    pub id: TherapistId,
    pub name: Option<String>,
    pub specialization: Option<String>,
    #[serde(alias = "experience_years")]
    pub experience: Option<i32>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub session_fee: Option<f64>,
    pub bio: Option<String>,
    #[serde(alias = "image_url", alias = "profile_image")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTimeSlot {
    pub id: SlotId,
    pub therapist_id: Option<TherapistId>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub is_booked: bool,
    pub therapist: Option<RawTherapist>,
}

/// Backends backed by MySQL send `0`/`1` for booleans.
fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}
