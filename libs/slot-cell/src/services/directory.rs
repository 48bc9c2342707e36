use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{SlotId, Therapist, TherapistId, TimeSlot};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TherapistSchedule {
    pub therapist: Therapist,
    pub slots: Vec<TimeSlot>,
}

impl TherapistSchedule {
    pub fn new(therapist: Therapist) -> Self {
        Self {
            therapist,
            slots: Vec::new(),
        }
    }

    pub fn slots_on(&self, date: NaiveDate) -> Vec<&TimeSlot> {
        self.slots.iter().filter(|s| s.date == date).collect()
    }

    pub fn available_on(&self, date: NaiveDate, now: NaiveDateTime) -> Vec<&TimeSlot> {
        self.slots
            .iter()
            .filter(|s| s.date == date && s.is_selectable(now))
            .collect()
    }
}

/// Therapist → slots mapping built from one slot fetch. This is the client's
/// local slot cache; `mark_booked` is the only mutation.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SlotDirectory {
    schedules: BTreeMap<TherapistId, TherapistSchedule>,
}

impl SlotDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `seed` only runs for a therapist not seen before.
    pub(crate) fn entry_with<F>(&mut self, therapist_id: TherapistId, seed: F) -> &mut TherapistSchedule
    where
        F: FnOnce() -> Therapist,
    {
        self.schedules
            .entry(therapist_id)
            .or_insert_with(|| TherapistSchedule::new(seed()))
    }

    pub(crate) fn sort_slots(&mut self) {
        for schedule in self.schedules.values_mut() {
            schedule
                .slots
                .sort_by(|a, b| a.starts_at().cmp(&b.starts_at()).then(a.id.cmp(&b.id)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn schedules(&self) -> impl Iterator<Item = &TherapistSchedule> {
        self.schedules.values()
    }

    pub fn therapist(&self, therapist_id: TherapistId) -> Option<&Therapist> {
        self.schedules.get(&therapist_id).map(|s| &s.therapist)
    }

    pub fn schedule(&self, therapist_id: TherapistId) -> Option<&TherapistSchedule> {
        self.schedules.get(&therapist_id)
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<&TimeSlot> {
        self.schedules
            .values()
            .flat_map(|s| s.slots.iter())
            .find(|s| s.id == slot_id)
    }

    pub fn slots_on(&self, therapist_id: TherapistId, date: NaiveDate) -> Vec<&TimeSlot> {
        self.schedules
            .get(&therapist_id)
            .map(|s| s.slots_on(date))
            .unwrap_or_default()
    }

    /// Therapists with at least one slot on `date`, booked or not.
    pub fn therapists_on(&self, date: NaiveDate) -> Vec<&Therapist> {
        self.schedules
            .values()
            .filter(|s| s.slots.iter().any(|slot| slot.date == date))
            .map(|s| &s.therapist)
            .collect()
    }

    /// Optimistically flips `is_booked`. Returns false when the slot is unknown.
    pub fn mark_booked(&mut self, slot_id: SlotId) -> bool {
        for schedule in self.schedules.values_mut() {
            if let Some(slot) = schedule.slots.iter_mut().find(|s| s.id == slot_id) {
                slot.is_booked = true;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn therapist(id: TherapistId) -> Therapist {
        Therapist {
            id,
            name: format!("T{}", id),
            specialization: "Family Therapy".to_string(),
            experience: 3,
            email: None,
            phone: None,
            session_fee: 5000.0,
            bio: String::new(),
            image: None,
        }
    }

    fn slot(id: SlotId, therapist_id: TherapistId, day: u32, hour: u32) -> TimeSlot {
        TimeSlot {
            id,
            therapist_id,
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            is_booked: false,
        }
    }

    fn directory() -> SlotDirectory {
        let mut dir = SlotDirectory::new();
        dir.entry_with(1, || therapist(1)).slots.extend([slot(2, 1, 20, 11), slot(1, 1, 20, 9)]);
        dir.entry_with(2, || therapist(2)).slots.push(slot(3, 2, 21, 9));
        dir.sort_slots();
        dir
    }

    #[test]
    fn test_slots_sorted_by_start() {
        let dir = directory();
        let ids: Vec<_> = dir
            .slots_on(1, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap())
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_therapists_on_date() {
        let dir = directory();
        let on_21: Vec<_> = dir
            .therapists_on(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap())
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(on_21, vec![2]);
    }

    #[test]
    fn test_mark_booked() {
        let mut dir = directory();
        assert!(dir.mark_booked(3));
        assert!(dir.slot(3).unwrap().is_booked);
        assert!(!dir.mark_booked(99));
    }

    #[test]
    fn test_available_excludes_booked_and_past() {
        let mut dir = directory();
        dir.mark_booked(2);
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let now = date.and_hms_opt(10, 0, 0).unwrap();
        assert!(dir.schedule(1).unwrap().available_on(date, now).is_empty());
    }
}
