use chrono::{DateTime, Utc};

/// What a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Machine,
    Reservation,
    Slot,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Machine => "machine",
            EntityKind::Reservation => "reservation",
            EntityKind::Slot => "slot",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenKind {
    /// Caller is blacklisted until the given instant.
    Banned { until: DateTime<Utc> },
    /// Caller is neither the record's owner nor an admin.
    NotOwner,
    /// Operation is restricted to admins.
    AdminRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Booking again too soon after the last one. Carries the remaining wait
    /// in whole minutes, rounded up, for user messaging.
    Cooldown { retry_after_minutes: i64 },
    /// Per-day booking quota reached.
    DailyQuota { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The requested interval overlaps one of the caller's own same-day
    /// reservations.
    Overlap,
    /// Another reservation already holds this machine/date/start.
    SlotTaken,
}

/// All conditions the engine surfaces to its callers. Every variant is a
/// local, recoverable condition with a stable discriminant; nothing here is
/// fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotFound(EntityKind),
    Forbidden(ForbiddenKind),
    RateLimited(RateLimitKind),
    Conflict(ConflictKind),
    InvalidRequest(&'static str),
    Internal(String),
}

impl EngineError {
    /// Stable snake_case label, used by transports to map onto status codes
    /// and as the rejection-reason metrics label.
    pub fn discriminant(&self) -> &'static str {
        match self {
            EngineError::NotFound(EntityKind::Machine) => "not_found_machine",
            EngineError::NotFound(EntityKind::Reservation) => "not_found_reservation",
            EngineError::NotFound(EntityKind::Slot) => "not_found_slot",
            EngineError::NotFound(EntityKind::User) => "not_found_user",
            EngineError::Forbidden(ForbiddenKind::Banned { .. }) => "forbidden_banned",
            EngineError::Forbidden(ForbiddenKind::NotOwner) => "forbidden_not_owner",
            EngineError::Forbidden(ForbiddenKind::AdminRequired) => "forbidden_admin_required",
            EngineError::RateLimited(RateLimitKind::Cooldown { .. }) => "rate_limited_cooldown",
            EngineError::RateLimited(RateLimitKind::DailyQuota { .. }) => "rate_limited_quota",
            EngineError::Conflict(ConflictKind::Overlap) => "conflict_overlap",
            EngineError::Conflict(ConflictKind::SlotTaken) => "conflict_slot_taken",
            EngineError::InvalidRequest(_) => "invalid_request",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(kind) => write!(f, "{kind} not found"),
            EngineError::Forbidden(ForbiddenKind::Banned { until }) => {
                write!(f, "account is banned from booking until {until}")
            }
            EngineError::Forbidden(ForbiddenKind::NotOwner) => {
                write!(f, "caller does not own this reservation")
            }
            EngineError::Forbidden(ForbiddenKind::AdminRequired) => {
                write!(f, "admin privileges required")
            }
            EngineError::RateLimited(RateLimitKind::Cooldown {
                retry_after_minutes,
            }) => {
                write!(f, "booking again too soon, retry in {retry_after_minutes} min")
            }
            EngineError::RateLimited(RateLimitKind::DailyQuota { limit }) => {
                write!(f, "daily booking limit of {limit} reached")
            }
            EngineError::Conflict(ConflictKind::Overlap) => {
                write!(f, "overlaps one of the caller's same-day reservations")
            }
            EngineError::Conflict(ConflictKind::SlotTaken) => {
                write!(f, "slot is already reserved")
            }
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EngineError::Internal(e) => write!(f, "internal error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
