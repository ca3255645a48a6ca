use chrono::NaiveDate;

use crate::model::{BlacklistEntry, Identity, Machine, ReservationView, Slot};

use super::conflict::now_local;
use super::error::{EngineError, EntityKind};
use super::slots::generate_slots;
use super::Engine;

impl Engine {
    pub fn list_machines(&self) -> Vec<Machine> {
        let mut machines = self.store.machines.all();
        machines.sort_by_key(|m| m.id);
        machines
    }

    /// The slot grid for one machine-day: past hours masked first, then
    /// occupied slots. `date` defaults to today.
    pub fn get_slots(
        &self,
        machine_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Slot>, EngineError> {
        if !self.store.machines.contains(machine_id) {
            return Err(EngineError::NotFound(EntityKind::Machine));
        }
        let now = now_local();
        let date = date.unwrap_or_else(|| now.date());
        let mut grid = generate_slots(machine_id, date, &self.config().window(), now);

        let booked = self
            .store
            .reservations
            .find(|r| r.machine_id == machine_id && r.date == date);
        for slot in &mut grid {
            if booked.iter().any(|r| r.span.start == slot.span.start) {
                slot.available = false;
            }
        }
        Ok(grid)
    }

    /// Reservations with their derived status, ordered by date then start
    /// hour. `user_id` filters to one user's bookings.
    pub fn list_reservations(&self, user_id: Option<i64>) -> Vec<ReservationView> {
        let now = now_local();
        let mut records = match user_id {
            Some(uid) => self.store.reservations.find(|r| r.user_id == uid),
            None => self.store.reservations.all(),
        };
        records.sort_by_key(|r| (r.date, r.span.start, r.id));
        records
            .into_iter()
            .map(|reservation| {
                let status = reservation.status_at(now);
                ReservationView {
                    reservation,
                    status,
                }
            })
            .collect()
    }

    /// Admin audit view of currently recorded bans (expired ones included
    /// until cleared).
    pub fn list_blacklist(&self, caller: &Identity) -> Result<Vec<BlacklistEntry>, EngineError> {
        Self::require_admin(caller)?;
        let mut entries: Vec<BlacklistEntry> = self
            .store
            .users
            .find(|u| u.banned_until.is_some())
            .into_iter()
            .map(|u| BlacklistEntry {
                id: u.id,
                username: u.username,
                name: u.name,
                banned_until: u.banned_until.expect("filtered on Some"),
            })
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }
}
