use chrono::NaiveDate;
use tracing::{debug, info};

use crate::limits::{MAX_NAME_LEN, MAX_TEXT_LEN};
use crate::model::{
    Identity, Machine, MachineStatus, NewMachine, Reservation,
};
use crate::observability;

use super::conflict::{self, now_local, now_utc};
use super::error::{ConflictKind, EngineError, EntityKind, ForbiddenKind};
use super::slots::{find_slot, generate_slots};
use super::Engine;

/// Record a rejected booking attempt before handing the error back.
fn rejected(err: EngineError) -> EngineError {
    metrics::counter!(observability::BOOKINGS_REJECTED_TOTAL, "reason" => err.discriminant())
        .increment(1);
    debug!("booking rejected: {err}");
    err
}

impl Engine {
    /// Create a reservation for `user_id` on `machine_id` at the slot named
    /// by `slot_id`. `date` defaults to today.
    ///
    /// All admission checks run again under the user and machine-day locks;
    /// whatever an earlier read showed, the state at the commit point
    /// decides.
    pub async fn create_reservation(
        &self,
        user_id: i64,
        machine_id: i64,
        slot_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Reservation, EngineError> {
        let now = now_local();
        let now_instant = now_utc();
        let date = date.unwrap_or_else(|| now.date());

        let machine = self
            .store
            .machines
            .get(machine_id)
            .ok_or_else(|| rejected(EngineError::NotFound(EntityKind::Machine)))?;
        let grid = generate_slots(machine_id, date, &self.config().window(), now);
        let slot = find_slot(&grid, slot_id);

        let user_lock = self.user_lock(user_id);
        let _user_guard = user_lock.lock().await;
        let day_lock = self.day_lock(machine_id, date);
        let _day_guard = day_lock.lock().await;

        // the machine may have been removed while we waited for the locks
        if !self.store.machines.contains(machine_id) {
            return Err(rejected(EngineError::NotFound(EntityKind::Machine)));
        }

        self.check_blacklist(user_id, now_instant).map_err(rejected)?;
        self.check_cooldown(user_id, now_instant).map_err(rejected)?;
        self.check_quota(user_id, date, None).map_err(rejected)?;
        if let Some(s) = &slot {
            self.check_overlap(user_id, date, &s.span, None)
                .map_err(rejected)?;
        }
        let span = self.check_slot(slot.as_ref(), date, now).map_err(rejected)?;

        let day = self
            .store
            .reservations
            .find(|r| r.machine_id == machine_id && r.date == date);
        if conflict::occupant(&day, span.start).is_some() {
            return Err(rejected(EngineError::Conflict(ConflictKind::SlotTaken)));
        }

        let id = self.store.reservations.allocate_id();
        let reservation = Reservation {
            id,
            user_id,
            machine_id,
            machine_name: machine.name.clone(),
            date,
            span,
            created_at: now_instant,
        };
        self.store.reservations.insert(id, reservation.clone());

        metrics::counter!(observability::RESERVATIONS_CREATED_TOTAL).increment(1);
        info!(
            "reservation {id} created: user={user_id} machine={machine_id} {date} {}",
            span.start_label()
        );
        Ok(reservation)
    }

    /// Move an existing reservation to a new date/slot on the same machine.
    /// Identity and `created_at` are preserved; a move neither consumes nor
    /// resets the cooldown clock.
    pub async fn reschedule_reservation(
        &self,
        reservation_id: i64,
        caller: &Identity,
        new_date: NaiveDate,
        new_slot_id: i64,
    ) -> Result<(), EngineError> {
        let now = now_local();
        let now_instant = now_utc();

        let reservation = self
            .store
            .reservations
            .get(reservation_id)
            .ok_or_else(|| rejected(EngineError::NotFound(EntityKind::Reservation)))?;
        if reservation.user_id != caller.user_id && !caller.is_admin() {
            return Err(rejected(EngineError::Forbidden(ForbiddenKind::NotOwner)));
        }

        let machine_id = reservation.machine_id;
        let owner_id = reservation.user_id;
        let grid = generate_slots(machine_id, new_date, &self.config().window(), now);
        let slot = find_slot(&grid, new_slot_id);

        let user_lock = self.user_lock(owner_id);
        let _user_guard = user_lock.lock().await;
        let day_lock = self.day_lock(machine_id, new_date);
        let _day_guard = day_lock.lock().await;

        // the record may have been cancelled while we waited for the locks
        if !self.store.reservations.contains(reservation_id) {
            return Err(rejected(EngineError::NotFound(EntityKind::Reservation)));
        }

        self.check_blacklist(caller.user_id, now_instant)
            .map_err(rejected)?;
        self.check_quota(owner_id, new_date, Some(reservation_id))
            .map_err(rejected)?;
        if let Some(s) = &slot {
            self.check_overlap(owner_id, new_date, &s.span, Some(reservation_id))
                .map_err(rejected)?;
        }
        let span = self
            .check_slot(slot.as_ref(), new_date, now)
            .map_err(rejected)?;

        let day = self.store.reservations.find(|r| {
            r.machine_id == machine_id && r.date == new_date && r.id != reservation_id
        });
        if conflict::occupant(&day, span.start).is_some() {
            return Err(rejected(EngineError::Conflict(ConflictKind::SlotTaken)));
        }

        self.store.reservations.update(reservation_id, |r| {
            r.date = new_date;
            r.span = span;
        });

        metrics::counter!(observability::RESERVATIONS_RESCHEDULED_TOTAL).increment(1);
        info!(
            "reservation {reservation_id} rescheduled to {new_date} {}",
            span.start_label()
        );
        Ok(())
    }

    /// Cancel a reservation. Cancelling an id that no longer exists is a
    /// success: the caller wanted it gone and it is.
    pub async fn cancel_reservation(
        &self,
        reservation_id: i64,
        caller: &Identity,
    ) -> Result<(), EngineError> {
        let Some(reservation) = self.store.reservations.get(reservation_id) else {
            return Ok(());
        };
        if reservation.user_id != caller.user_id && !caller.is_admin() {
            return Err(rejected(EngineError::Forbidden(ForbiddenKind::NotOwner)));
        }
        if self.store.reservations.remove(reservation_id).is_some() {
            metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
            info!("reservation {reservation_id} cancelled by user {}", caller.user_id);
        }
        Ok(())
    }

    // ── Admin operations ─────────────────────────────────────

    pub async fn create_machine(
        &self,
        caller: &Identity,
        new: NewMachine,
    ) -> Result<Machine, EngineError> {
        Self::require_admin(caller)?;
        if new.name.trim().is_empty() || new.location.trim().is_empty() {
            return Err(EngineError::InvalidRequest("name and location are required"));
        }
        if new.name.len() > MAX_NAME_LEN || new.location.len() > MAX_NAME_LEN {
            return Err(EngineError::InvalidRequest("name or location too long"));
        }
        if new.guide.len() > MAX_TEXT_LEN {
            return Err(EngineError::InvalidRequest("guide too long"));
        }

        let id = self.store.machines.allocate_id();
        let machine = Machine {
            id,
            name: new.name,
            location: new.location,
            building: new.building,
            floor: new.floor,
            status: new.status.unwrap_or(MachineStatus::Idle),
            guide: new.guide,
        };
        self.store.machines.insert(id, machine.clone());
        metrics::gauge!(observability::MACHINES_ACTIVE).increment(1.0);
        info!("machine {id} created: {}", machine.name);
        Ok(machine)
    }

    /// Remove a machine and every reservation on it. The machine strongly
    /// owns its reservations' existence, so removal cascades.
    pub async fn remove_machine(
        &self,
        caller: &Identity,
        machine_id: i64,
    ) -> Result<(), EngineError> {
        Self::require_admin(caller)?;
        if self.store.machines.remove(machine_id).is_none() {
            return Err(EngineError::NotFound(EntityKind::Machine));
        }
        let cascaded = self
            .store
            .reservations
            .remove_where(|r| r.machine_id == machine_id);
        self.forget_day_locks(machine_id);
        metrics::gauge!(observability::MACHINES_ACTIVE).decrement(1.0);
        info!("machine {machine_id} removed, {cascaded} reservations cascaded");
        Ok(())
    }

    /// Admin override freeing reserved slots: one slot when `slot_id` is
    /// given, otherwise the whole machine-day. Returns how many reservations
    /// were released.
    pub async fn release_slots(
        &self,
        caller: &Identity,
        machine_id: i64,
        date: Option<NaiveDate>,
        slot_id: Option<i64>,
    ) -> Result<usize, EngineError> {
        Self::require_admin(caller)?;
        if !self.store.machines.contains(machine_id) {
            return Err(EngineError::NotFound(EntityKind::Machine));
        }
        let now = now_local();
        let date = date.unwrap_or_else(|| now.date());

        let day_lock = self.day_lock(machine_id, date);
        let _day_guard = day_lock.lock().await;

        let released = match slot_id {
            Some(slot_id) => {
                let grid = generate_slots(machine_id, date, &self.config().window(), now);
                let slot =
                    find_slot(&grid, slot_id).ok_or(EngineError::NotFound(EntityKind::Slot))?;
                self.store.reservations.remove_where(|r| {
                    r.machine_id == machine_id && r.date == date && r.span.start == slot.span.start
                })
            }
            None => self
                .store
                .reservations
                .remove_where(|r| r.machine_id == machine_id && r.date == date),
        };
        if released > 0 {
            info!("released {released} reservations on machine {machine_id} for {date}");
        }
        Ok(released)
    }

    /// Set or clear a user's ban. `banned_until` in the past is equivalent
    /// to clearing it.
    pub async fn set_blacklist(
        &self,
        caller: &Identity,
        user_id: i64,
        banned_until: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), EngineError> {
        Self::require_admin(caller)?;
        let found = self
            .store
            .users
            .update(user_id, |u| u.banned_until = banned_until);
        if !found {
            return Err(EngineError::NotFound(EntityKind::User));
        }
        match banned_until {
            Some(until) => info!("user {user_id} blacklisted until {until}"),
            None => info!("user {user_id} removed from blacklist"),
        }
        Ok(())
    }
}
