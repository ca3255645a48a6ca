use chrono::{DateTime, Local, NaiveDateTime, Utc};

use crate::model::{HourSpan, Reservation};

/// Local wall-clock time, read once per operation and threaded into the pure
/// checks below.
pub(crate) fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Instant used for cooldown arithmetic and ban expiry.
pub(crate) fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// First reservation in `existing` whose interval overlaps `span`.
/// Callers pass the candidate set already filtered to one user and date
/// (and with the record being rescheduled excluded).
pub fn find_overlap<'a>(existing: &'a [Reservation], span: &HourSpan) -> Option<&'a Reservation> {
    existing.iter().find(|r| r.span.overlaps(span))
}

/// The reservation holding the exact start hour, if any. Generated slots
/// never overlap each other, so per-machine-day occupancy reduces to
/// start-hour equality rather than interval math.
pub fn occupant<'a>(existing: &'a [Reservation], start_hour: u8) -> Option<&'a Reservation> {
    existing.iter().find(|r| r.span.start == start_hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reservation(id: i64, user_id: i64, start: u8, end: u8) -> Reservation {
        Reservation {
            id,
            user_id,
            machine_id: 3,
            machine_name: "A-03".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            span: HourSpan::new(start, end),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn overlap_detected() {
        let existing = vec![reservation(1, 7, 9, 10), reservation(2, 7, 14, 15)];
        assert_eq!(
            find_overlap(&existing, &HourSpan::new(9, 10)).map(|r| r.id),
            Some(1)
        );
        // adjacent interval does not overlap
        assert!(find_overlap(&existing, &HourSpan::new(10, 11)).is_none());
        assert!(find_overlap(&existing, &HourSpan::new(11, 14)).is_none());
    }

    #[test]
    fn occupant_matches_exact_start() {
        let existing = vec![reservation(1, 7, 9, 10)];
        assert!(occupant(&existing, 9).is_some());
        assert!(occupant(&existing, 10).is_none());
    }

    #[test]
    fn empty_set_has_no_conflicts() {
        assert!(find_overlap(&[], &HourSpan::new(9, 10)).is_none());
        assert!(occupant(&[], 9).is_none());
    }
}
