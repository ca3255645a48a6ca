//! Admission checks for booking creation and reschedule. Checks run in a
//! fixed order and short-circuit on the first failure; each failure is a
//! distinct error variant so transports can message users precisely.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::model::{HourSpan, Slot};

use super::conflict;
use super::error::{ConflictKind, EngineError, EntityKind, ForbiddenKind, RateLimitKind};
use super::Engine;

impl Engine {
    /// Blacklist: a `banned_until` strictly in the future blocks the caller.
    pub(super) fn check_blacklist(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let user = self
            .store
            .users
            .get(user_id)
            .ok_or(EngineError::NotFound(EntityKind::User))?;
        match user.banned_until {
            Some(until) if until > now => {
                Err(EngineError::Forbidden(ForbiddenKind::Banned { until }))
            }
            _ => Ok(()),
        }
    }

    /// Cooldown: the caller's most recent reservation by `created_at` opens
    /// a quiet window. Cancelled records are gone from the ledger, so they
    /// no longer hold the window (stated policy, see DESIGN.md).
    pub(super) fn check_cooldown(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let cooldown = self.config().cooldown;
        if cooldown.is_zero() {
            return Ok(());
        }
        let last = self
            .store
            .reservations
            .find(|r| r.user_id == user_id)
            .into_iter()
            .map(|r| r.created_at)
            .max();
        if let Some(created_at) = last {
            let elapsed = now - created_at;
            if elapsed < cooldown {
                let remaining = cooldown - elapsed;
                // round up to whole minutes, never report "0 minutes"
                let retry_after_minutes = ((remaining.num_seconds() + 59) / 60).max(1);
                return Err(EngineError::RateLimited(RateLimitKind::Cooldown {
                    retry_after_minutes,
                }));
            }
        }
        Ok(())
    }

    /// Daily quota on the target date. `exclude` carries the id of a record
    /// being rescheduled so a move never counts against itself.
    pub(super) fn check_quota(
        &self,
        user_id: i64,
        date: NaiveDate,
        exclude: Option<i64>,
    ) -> Result<(), EngineError> {
        let limit = self.config().daily_limit_per_user;
        let held = self.store.reservations.count(|r| {
            r.user_id == user_id && r.date == date && Some(r.id) != exclude
        });
        if held >= limit {
            return Err(EngineError::RateLimited(RateLimitKind::DailyQuota { limit }));
        }
        Ok(())
    }

    /// Same-day overlap against the caller's other reservations.
    pub(super) fn check_overlap(
        &self,
        user_id: i64,
        date: NaiveDate,
        span: &HourSpan,
        exclude: Option<i64>,
    ) -> Result<(), EngineError> {
        let same_day = self.store.reservations.find(|r| {
            r.user_id == user_id && r.date == date && Some(r.id) != exclude
        });
        if conflict::find_overlap(&same_day, span).is_some() {
            return Err(EngineError::Conflict(ConflictKind::Overlap));
        }
        Ok(())
    }

    /// Slot validity: the id must resolve within the generated grid, and the
    /// slot's hour must not have elapsed today.
    pub(super) fn check_slot(
        &self,
        slot: Option<&Slot>,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<HourSpan, EngineError> {
        let slot = slot.ok_or(EngineError::NotFound(EntityKind::Slot))?;
        if date == now.date() && slot.span.end <= now.hour() as u8 {
            return Err(EngineError::InvalidRequest("slot already elapsed"));
        }
        Ok(slot.span)
    }
}
