//! Service configuration.
//!
//! Values come from code (the builder), from any serde source a host already
//! uses, or from `SEATLOCK_*` environment variables. All paths end in
//! [`ReservationConfig::validate`].
//!
//! # Example
//!
//! ```rust
//! use seatlock::config::ReservationConfig;
//! use std::time::Duration;
//!
//! let config = ReservationConfig::builder()
//!     .seat_count(5)
//!     .lock_ttl(Duration::from_secs(60))
//!     .expiry_grace(Duration::from_millis(50))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.seat_count, 5);
//! ```

use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Longest lock a caller may request.
pub const MAX_LOCK_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub const ENV_SEAT_COUNT: &str = "SEATLOCK_SEAT_COUNT";
pub const ENV_LOCK_TTL_MS: &str = "SEATLOCK_LOCK_TTL_MS";
pub const ENV_EXPIRY_GRACE_MS: &str = "SEATLOCK_EXPIRY_GRACE_MS";
pub const ENV_ACTIVE_EXPIRY: &str = "SEATLOCK_ACTIVE_EXPIRY";
pub const ENV_SWEEP_INTERVAL_MS: &str = "SEATLOCK_SWEEP_INTERVAL_MS";
pub const ENV_ALLOW_OWNER_REFRESH: &str = "SEATLOCK_ALLOW_OWNER_REFRESH";
pub const ENV_HISTORY_LIMIT: &str = "SEATLOCK_HISTORY_LIMIT";

/// Errors raised while loading or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Seat count must be at least 1")]
    NoSeats,

    #[error("Lock TTL must be positive")]
    ZeroLockTtl,

    #[error("Lock TTL {ttl:?} exceeds the maximum of {max:?}")]
    LockTtlTooLong { ttl: Duration, max: Duration },

    #[error("Sweep interval must be positive when set")]
    ZeroSweepInterval,

    #[error("Environment variable {var} has invalid value '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Everything the reservation core accepts from its host, except the clock.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    /// Number of seats created at start, with ids `1..=seat_count`.
    pub seat_count: u32,

    /// Lifetime of a lock unless the caller passes its own.
    pub lock_ttl: Duration,

    /// Delay after a deadline before the scheduled reclamation fires.
    pub expiry_grace: Duration,

    /// Schedule one reclamation callback per lock.
    pub active_expiry: bool,

    /// Period of the full-table sweep; `None` disables it.
    pub sweep_interval: Option<Duration>,

    /// Let an owner re-lock a seat it already holds to extend the deadline.
    pub allow_owner_refresh: bool,

    /// Transitions retained per seat.
    pub history_limit: usize,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            seat_count: 10,
            lock_ttl: Duration::from_secs(60),
            expiry_grace: Duration::from_millis(50),
            active_expiry: true,
            sweep_interval: None,
            allow_owner_refresh: false,
            history_limit: 16,
        }
    }
}

impl ReservationConfig {
    pub fn builder() -> ReservationConfigBuilder {
        ReservationConfigBuilder::new()
    }

    /// Check that the configuration can back a running service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seat_count == 0 {
            return Err(ConfigError::NoSeats);
        }
        validate_ttl(self.lock_ttl)?;
        if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }

    /// Load defaults overridden by `SEATLOCK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`ReservationConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(count) = parse_var(&lookup, ENV_SEAT_COUNT)? {
            config.seat_count = count;
        }
        if let Some(ms) = parse_var(&lookup, ENV_LOCK_TTL_MS)? {
            config.lock_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, ENV_EXPIRY_GRACE_MS)? {
            config.expiry_grace = Duration::from_millis(ms);
        }
        if let Some(enabled) = parse_flag(&lookup, ENV_ACTIVE_EXPIRY)? {
            config.active_expiry = enabled;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_SWEEP_INTERVAL_MS)? {
            // 0 switches the sweeper off
            config.sweep_interval = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(enabled) = parse_flag(&lookup, ENV_ALLOW_OWNER_REFRESH)? {
            config.allow_owner_refresh = enabled;
        }
        if let Some(limit) = parse_var(&lookup, ENV_HISTORY_LIMIT)? {
            config.history_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Lock durations must be positive and bounded.
pub(crate) fn validate_ttl(ttl: Duration) -> Result<(), ConfigError> {
    if ttl.is_zero() {
        return Err(ConfigError::ZeroLockTtl);
    }
    if ttl > MAX_LOCK_TTL {
        return Err(ConfigError::LockTtlTooLong {
            ttl,
            max: MAX_LOCK_TTL,
        });
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnv { var, value }),
        },
    }
}

/// Fluent builder for [`ReservationConfig`]
pub struct ReservationConfigBuilder {
    config: ReservationConfig,
}

impl ReservationConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ReservationConfig::default(),
        }
    }

    pub fn seat_count(mut self, count: u32) -> Self {
        self.config.seat_count = count;
        self
    }

    pub fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.config.lock_ttl = ttl;
        self
    }

    pub fn expiry_grace(mut self, grace: Duration) -> Self {
        self.config.expiry_grace = grace;
        self
    }

    pub fn active_expiry(mut self, enabled: bool) -> Self {
        self.config.active_expiry = enabled;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    pub fn allow_owner_refresh(mut self, allowed: bool) -> Self {
        self.config.allow_owner_refresh = allowed;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ReservationConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ReservationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
