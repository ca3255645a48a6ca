//! spindry: a booking engine for shared laundry machines.
//!
//! Fixed one-hour slots on capacity-one machines, booked per calendar day
//! under fairness rules: per-user daily quotas, cooldown throttling between
//! bookings, and temporary bans. Reservation lifecycle state
//! (pending/ongoing/completed) is derived from wall-clock time on every
//! read, never stored.
//!
//! This crate is the engine only. Transports (HTTP, CLI) and authentication
//! live in the embedding service and call [`Engine`] with an [`model::Identity`]
//! issued by their own auth layer.

pub mod config;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod store;

pub use config::{BookingConfig, ConfigError};
pub use engine::{
    ConflictKind, DailyStats, Engine, EngineError, EntityKind, ExportFilter, ForbiddenKind,
    RateLimitKind,
};
pub use store::Store;
