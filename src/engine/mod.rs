mod conflict;
mod error;
mod guard;
mod mutations;
mod queries;
mod report;
mod slots;

pub use error::{ConflictKind, EngineError, EntityKind, ForbiddenKind, RateLimitKind};
pub use report::{DailyStats, ExportFilter};
pub use slots::{find_slot, generate_slots};

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::BookingConfig;
use crate::model::Identity;
use crate::store::Store;

/// The booking engine. Cheap to share behind an `Arc`; every public
/// operation corresponds to one inbound request.
///
/// Writers serialize on two keyed lock domains: one mutex per user (quota,
/// cooldown, and same-day overlap are per-user invariants) and one per
/// machine-day (slot occupancy is a per-machine-day invariant). Every write
/// path takes the user lock before the machine-day lock; the fixed order
/// keeps the two domains deadlock-free. All admission checks re-run after
/// both locks are held, so the insert is validated at the point of commit
/// rather than trusting an earlier read.
pub struct Engine {
    pub store: Store,
    config: BookingConfig,
    user_locks: DashMap<i64, Arc<Mutex<()>>>,
    day_locks: DashMap<(i64, NaiveDate), Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(store: Store, config: BookingConfig) -> Self {
        Self {
            store,
            config,
            user_locks: DashMap::new(),
            day_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub(super) fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().value().clone()
    }

    pub(super) fn day_lock(&self, machine_id: i64, date: NaiveDate) -> Arc<Mutex<()>> {
        self.day_locks
            .entry((machine_id, date))
            .or_default()
            .value()
            .clone()
    }

    /// Drop lock entries for a machine that no longer exists.
    pub(super) fn forget_day_locks(&self, machine_id: i64) {
        self.day_locks.retain(|(mid, _), _| *mid != machine_id);
    }

    pub(super) fn require_admin(caller: &Identity) -> Result<(), EngineError> {
        if caller.is_admin() {
            Ok(())
        } else {
            Err(EngineError::Forbidden(ForbiddenKind::AdminRequired))
        }
    }
}
