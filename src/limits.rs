//! Hard bounds the engine enforces on inputs.

/// Slot ids are encoded `machine_id * SLOT_ID_STRIDE + hour_index`. The
/// encoding stays collision-free across machines only while the operating
/// window is shorter than the stride; configuration validation enforces it.
pub const SLOT_ID_STRIDE: i64 = 1000;

/// Max length of a machine name or location.
pub const MAX_NAME_LEN: usize = 256;

/// Max length of free-text fields (usage guide).
pub const MAX_TEXT_LEN: usize = 2048;
