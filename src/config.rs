use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::Duration;
use tracing::{info, warn};

use crate::limits::SLOT_ID_STRIDE;
use crate::model::HourSpan;

/// Booking policy knobs, normally sourced from the environment.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// First bookable hour of the day (inclusive).
    pub daily_start_hour: u8,
    /// Last bookable hour of the day (exclusive). 24 means midnight.
    pub daily_end_hour: u8,
    /// Max reservations a user may hold per calendar date.
    pub daily_limit_per_user: usize,
    /// Minimum gap between a user's consecutive booking creations.
    /// Zero disables the check.
    pub cooldown: Duration,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            daily_start_hour: 8,
            daily_end_hour: 22,
            daily_limit_per_user: 2,
            cooldown: Duration::zero(),
        }
    }
}

impl BookingConfig {
    /// Read configuration from `SPINDRY_*` environment variables, falling
    /// back to defaults. The cooldown defaults to 30 minutes when
    /// `SPINDRY_ENV=production` and 0 otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        let production = env::var("SPINDRY_ENV").is_ok_and(|v| v == "production");
        let default_cooldown = if production { "30" } else { "0" };

        let config = Self {
            daily_start_hour: load_or("SPINDRY_DAILY_START_HOUR", "8")?,
            daily_end_hour: load_or("SPINDRY_DAILY_END_HOUR", "22")?,
            daily_limit_per_user: load_or("SPINDRY_DAILY_LIMIT_PER_USER", "2")?,
            cooldown: Duration::minutes(load_or("SPINDRY_COOLDOWN_MINUTES", default_cooldown)?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a config directly, applying the same validation as `from_env`.
    pub fn new(
        daily_start_hour: u8,
        daily_end_hour: u8,
        daily_limit_per_user: usize,
        cooldown: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            daily_start_hour,
            daily_end_hour,
            daily_limit_per_user,
            cooldown,
        };
        config.validate()?;
        Ok(config)
    }

    /// The operating window as a span.
    pub fn window(&self) -> HourSpan {
        HourSpan::new(self.daily_start_hour, self.daily_end_hour)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_start_hour >= self.daily_end_hour {
            return Err(ConfigError::Invalid("daily window must be non-empty"));
        }
        if self.daily_end_hour > 24 {
            return Err(ConfigError::Invalid("daily window must end within the day"));
        }
        if (self.daily_end_hour - self.daily_start_hour) as i64 >= SLOT_ID_STRIDE {
            return Err(ConfigError::Invalid("daily window exceeds the slot id stride"));
        }
        if self.daily_limit_per_user == 0 {
            return Err(ConfigError::Invalid("daily limit must be at least 1"));
        }
        if self.cooldown < Duration::zero() {
            return Err(ConfigError::Invalid("cooldown must not be negative"));
        }
        Ok(())
    }
}

fn load_or<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(v) => v,
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    };
    raw.parse().map_err(|e: T::Err| {
        warn!("invalid {key} value {raw:?}: {e}");
        ConfigError::Parse(key)
    })
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
    Parse(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
            ConfigError::Parse(key) => write!(f, "could not parse {key}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_eight_to_twentytwo() {
        let config = BookingConfig::default();
        assert_eq!(config.window(), HourSpan::new(8, 22));
        assert_eq!(config.daily_limit_per_user, 2);
        assert!(config.cooldown.is_zero());
    }

    #[test]
    fn empty_window_rejected() {
        let result = BookingConfig::new(10, 10, 2, Duration::zero());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        let result = BookingConfig::new(12, 8, 2, Duration::zero());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn window_past_midnight_rejected() {
        let result = BookingConfig::new(8, 25, 2, Duration::zero());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn window_ending_at_midnight_allowed() {
        let config = BookingConfig::new(0, 24, 2, Duration::zero()).unwrap();
        assert_eq!(config.window().duration_hours(), 24);
    }

    #[test]
    fn zero_limit_rejected() {
        let result = BookingConfig::new(8, 22, 0, Duration::zero());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_cooldown_rejected() {
        let result = BookingConfig::new(8, 22, 2, Duration::minutes(-5));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
