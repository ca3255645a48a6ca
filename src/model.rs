use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hour-of-day labels in the `"H:00"` form the surrounding transport speaks
/// (`"8:00"`, `"14:00"`).
pub mod hour_label {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(hour: &u8, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{hour}:00"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let label = String::deserialize(d)?;
        let (hour, _) = label
            .split_once(':')
            .ok_or_else(|| de::Error::custom("expected an H:00 label"))?;
        hour.parse().map_err(de::Error::custom)
    }
}

/// Half-open interval `[start, end)` at hour-of-day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSpan {
    #[serde(with = "hour_label")]
    pub start: u8,
    #[serde(with = "hour_label")]
    pub end: u8,
}

impl HourSpan {
    pub fn new(start: u8, end: u8) -> Self {
        debug_assert!(start < end, "HourSpan start must be before end");
        debug_assert!(end <= 24, "HourSpan end must fit within a day");
        Self { start, end }
    }

    pub fn overlaps(&self, other: &HourSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[allow(dead_code)]
    pub fn contains_hour(&self, hour: u8) -> bool {
        self.start <= hour && hour < self.end
    }

    pub fn duration_hours(&self) -> u8 {
        self.end - self.start
    }

    pub fn start_label(&self) -> String {
        format!("{}:00", self.start)
    }

    pub fn end_label(&self) -> String {
        format!("{}:00", self.end)
    }
}

/// Local-time instant for `date` at `hour`. Hour 24 maps to the next day's
/// midnight so a window ending at 24 stays representable.
pub fn slot_instant(date: NaiveDate, hour: u8) -> NaiveDateTime {
    if hour >= 24 {
        (date + Days::new(1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
    } else {
        date.and_hms_opt(hour as u32, 0, 0)
            .expect("hour is within 0..24")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Idle,
    Busy,
}

/// A physical machine with capacity one reservation per slot. `status` is
/// informational only; the engine never gates bookings on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub building: String,
    pub floor: String,
    pub status: MachineStatus,
    pub guide: String,
}

/// Admin input for creating a machine.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMachine {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub floor: String,
    pub status: Option<MachineStatus>,
    #[serde(default)]
    pub guide: String,
}

/// One bookable interval on a machine-day. Derived on every query, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: i64,
    #[serde(flatten)]
    pub span: HourSpan,
    pub available: bool,
}

/// A reservation record. `machine_name` is a snapshot of the machine's name
/// at booking time; lifecycle status is computed from the clock, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub machine_id: i64,
    pub machine_name: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub span: HourSpan,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Ongoing,
    Completed,
}

impl Reservation {
    /// Derive lifecycle status from local wall-clock time.
    pub fn status_at(&self, now: NaiveDateTime) -> ReservationStatus {
        let start = slot_instant(self.date, self.span.start);
        let end = slot_instant(self.date, self.span.end);
        if now < start {
            ReservationStatus::Pending
        } else if now < end {
            ReservationStatus::Ongoing
        } else {
            ReservationStatus::Completed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Caller identity as issued by the external authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A member account. The booking path reads `banned_until` and nothing else;
/// only admin blacklist operations and the auth collaborator mutate users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub building: String,
    pub banned_until: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_banned(&self, now: DateTime<Utc>) -> bool {
        matches!(self.banned_until, Some(until) if until > now)
    }
}

// ── Query result types ───────────────────────────────────────────

/// A reservation together with its derived status, as returned by read paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub status: ReservationStatus,
}

/// Admin audit view of a banned user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub banned_until: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_span_basics() {
        let s = HourSpan::new(9, 12);
        assert_eq!(s.duration_hours(), 3);
        assert!(s.contains_hour(9));
        assert!(s.contains_hour(11));
        assert!(!s.contains_hour(12)); // half-open
        assert_eq!(s.start_label(), "9:00");
        assert_eq!(s.end_label(), "12:00");
    }

    #[test]
    fn hour_span_overlap() {
        let a = HourSpan::new(9, 11);
        let b = HourSpan::new(10, 12);
        let c = HourSpan::new(11, 13);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn slot_instant_end_of_day() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let midnight = slot_instant(date, 24);
        assert_eq!(midnight.date(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        let eight = slot_instant(date, 8);
        assert_eq!(eight, date.and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn status_derivation_boundaries() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let r = Reservation {
            id: 1,
            user_id: 7,
            machine_id: 3,
            machine_name: "A-01".into(),
            date,
            span: HourSpan::new(9, 10),
            created_at: Utc::now(),
        };

        let before = date.and_hms_opt(8, 59, 59).unwrap();
        let at_start = date.and_hms_opt(9, 0, 0).unwrap();
        let inside = date.and_hms_opt(9, 30, 0).unwrap();
        let at_end = date.and_hms_opt(10, 0, 0).unwrap();

        assert_eq!(r.status_at(before), ReservationStatus::Pending);
        assert_eq!(r.status_at(at_start), ReservationStatus::Ongoing);
        assert_eq!(r.status_at(inside), ReservationStatus::Ongoing);
        assert_eq!(r.status_at(at_end), ReservationStatus::Completed);
    }

    #[test]
    fn ban_expiry() {
        let user = User {
            id: 2,
            username: "student".into(),
            password: "123456".into(),
            name: "Student".into(),
            role: Role::User,
            building: "B".into(),
            banned_until: Some(Utc::now() + chrono::Duration::hours(1)),
        };
        assert!(user.is_banned(Utc::now()));
        assert!(!user.is_banned(Utc::now() + chrono::Duration::hours(2)));

        let clear = User {
            banned_until: None,
            ..user
        };
        assert!(!clear.is_banned(Utc::now()));
    }

    #[test]
    fn slot_serializes_with_hour_labels() {
        let slot = Slot {
            id: 3009,
            span: HourSpan::new(17, 18),
            available: true,
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["start"], "17:00");
        assert_eq!(json["end"], "18:00");
        let back: Slot = serde_json::from_value(json).unwrap();
        assert_eq!(back, slot);
    }
}
