use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::limits::SLOT_ID_STRIDE;
use crate::model::{HourSpan, Slot};

/// Generate the fixed slot grid for one machine-day: one slot per hour of
/// the operating window, ordered by start hour.
///
/// Slot ids encode `machine_id * SLOT_ID_STRIDE + hour_index`, so they are
/// stable across queries and unique across machines (the window is validated
/// to fit the stride). When `date` is today, slots whose hour has already
/// elapsed are masked unavailable; occupancy masking happens later, in the
/// read path.
pub fn generate_slots(
    machine_id: i64,
    date: NaiveDate,
    window: &HourSpan,
    now: NaiveDateTime,
) -> Vec<Slot> {
    let elapsed_cutoff = if date == now.date() {
        Some(now.hour() as u8)
    } else {
        None
    };

    (window.start..window.end)
        .map(|hour| {
            let span = HourSpan::new(hour, hour + 1);
            let available = match elapsed_cutoff {
                Some(current_hour) => span.end > current_hour,
                None => true,
            };
            Slot {
                id: machine_id * SLOT_ID_STRIDE + (hour - window.start) as i64,
                span,
                available,
            }
        })
        .collect()
}

/// Look up a slot by id within a generated grid.
pub fn find_slot(slots: &[Slot], slot_id: i64) -> Option<Slot> {
    slots.iter().find(|s| s.id == slot_id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> HourSpan {
        HourSpan::new(8, 22)
    }

    fn other_day_noon() -> NaiveDateTime {
        // fixed instant on a different date than the queried one
        NaiveDate::from_ymd_opt(2024, 4, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn grid_covers_the_window_in_order() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let slots = generate_slots(3, date, &window(), other_day_noon());

        assert_eq!(slots.len(), 14); // 22 - 8
        assert_eq!(slots[0].span, HourSpan::new(8, 9));
        assert_eq!(slots[13].span, HourSpan::new(21, 22));
        for pair in slots.windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start); // contiguous
            assert!(pair[0].id < pair[1].id);
        }
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn slot_ids_encode_machine_and_hour_index() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let slots = generate_slots(3, date, &window(), other_day_noon());
        assert_eq!(slots[0].id, 3000);
        assert_eq!(slots[1].id, 3001);

        let other = generate_slots(4, date, &window(), other_day_noon());
        assert_eq!(other[0].id, 4000); // no collision across machines
    }

    #[test]
    fn past_hours_masked_for_today() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let now = date.and_hms_opt(10, 15, 0).unwrap();
        let slots = generate_slots(3, date, &window(), now);

        for slot in &slots {
            if slot.span.end <= 10 {
                assert!(!slot.available, "slot {:?} should be elapsed", slot.span);
            } else {
                assert!(slot.available, "slot {:?} should be open", slot.span);
            }
        }
        // the in-progress hour [10, 11) is still bookable
        assert!(slots.iter().any(|s| s.span.start == 10 && s.available));
    }

    #[test]
    fn no_masking_for_other_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let slots = generate_slots(3, date, &window(), now);
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let now = date.and_hms_opt(9, 59, 59).unwrap();
        let a = generate_slots(3, date, &window(), now);
        let b = generate_slots(3, date, &window(), now);
        assert_eq!(a, b);
    }

    #[test]
    fn find_slot_by_id() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let slots = generate_slots(3, date, &window(), other_day_noon());
        assert_eq!(find_slot(&slots, 3001).unwrap().span, HourSpan::new(9, 10));
        assert!(find_slot(&slots, 9999).is_none());
    }
}
