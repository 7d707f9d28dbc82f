//! Channel configuration.
//!
//! All knobs are enumerated and validated once at channel construction.
//! Invalid combinations are rejected there with a [`ConfigError`], never at
//! seal/open time.

use std::time::Duration;

use crate::{error::ConfigError, normalize::PrimeStrategy};

/// Default application context for key derivation.
pub const DEFAULT_CONTEXT: &[u8] = b"tidelock:v1";

/// Default slot duration (5 seconds).
pub const DEFAULT_SLOT_DURATION: Duration = Duration::from_secs(5);

/// Default drift window (±2 slots).
pub const DEFAULT_DRIFT_WINDOW: u64 = 2;

/// Minimum allowed secret refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Inclusive range of per-epoch slot durations when jitter is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    /// Shortest effective slot duration (whole seconds, at least 1)
    pub min: Duration,
    /// Longest effective slot duration (whole seconds, >= min)
    pub max: Duration,
}

/// Configuration for one protocol channel.
///
/// Both parties must construct their channels with identical `context`,
/// `slot_duration`, `prime_strategy`, `jitter`, and `refresh_interval`,
/// or they will derive different keys. `drift_window` only affects the
/// receiver's tolerance and may differ between peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Application context bytes mixed into every key derivation
    pub context: Vec<u8>,
    /// Duration of one time slot, whole seconds only (ignored per-epoch
    /// when jitter is set)
    pub slot_duration: Duration,
    /// Number of slots accepted on either side of the current slot
    pub drift_window: u64,
    /// Slot normalization strategy
    pub prime_strategy: PrimeStrategy,
    /// Optional deterministic per-epoch slot duration jitter
    pub jitter: Option<JitterRange>,
    /// Optional automatic secret rotation interval; enables the wire
    /// generation marker
    pub refresh_interval: Option<Duration>,
    /// Optional role tag separating directions or channels on one secret
    pub role: Option<Vec<u8>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_vec(),
            slot_duration: DEFAULT_SLOT_DURATION,
            drift_window: DEFAULT_DRIFT_WINDOW,
            prime_strategy: PrimeStrategy::None,
            jitter: None,
            refresh_interval: None,
            role: None,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// Slots are whole-second buckets, so durations with a fractional part
    /// are rejected here rather than silently truncated.
    ///
    /// # Errors
    ///
    /// - `InvalidSlotDuration` if the slot duration is under one second or
    ///   not a whole number of seconds
    /// - `InvalidJitterRange` if jitter bounds are under one second,
    ///   fractional, or inverted
    /// - `RefreshIntervalTooShort` if rotation is enabled below
    ///   [`MIN_REFRESH_INTERVAL`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_duration < Duration::from_secs(1) || self.slot_duration.subsec_nanos() != 0 {
            return Err(ConfigError::InvalidSlotDuration { duration: self.slot_duration });
        }

        if let Some(JitterRange { min, max }) = self.jitter {
            if min < Duration::from_secs(1)
                || max < min
                || min.subsec_nanos() != 0
                || max.subsec_nanos() != 0
            {
                return Err(ConfigError::InvalidJitterRange { min, max });
            }
        }

        if let Some(interval) = self.refresh_interval {
            if interval < MIN_REFRESH_INTERVAL {
                return Err(ConfigError::RefreshIntervalTooShort { interval });
            }
        }

        Ok(())
    }

    /// Whether packets on this channel carry the generation marker byte.
    pub fn ratchet_enabled(&self) -> bool {
        self.refresh_interval.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.context, b"tidelock:v1");
        assert_eq!(config.slot_duration, Duration::from_secs(5));
        assert_eq!(config.drift_window, 2);
        assert_eq!(config.prime_strategy, PrimeStrategy::None);
        assert!(!config.ratchet_enabled());
    }

    #[test]
    fn reject_subsecond_slot_duration() {
        let config = Config { slot_duration: Duration::from_millis(500), ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlotDuration { .. })));
    }

    #[test]
    fn reject_zero_slot_duration() {
        let config = Config { slot_duration: Duration::ZERO, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlotDuration { .. })));
    }

    #[test]
    fn reject_fractional_slot_duration() {
        // 1.5s is over the minimum but not a whole second; truncating it
        // would mislabel the configuration instead of honoring it
        let config = Config { slot_duration: Duration::from_millis(1500), ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlotDuration { .. })));
    }

    #[test]
    fn reject_inverted_jitter_range() {
        let config = Config {
            jitter: Some(JitterRange {
                min: Duration::from_secs(10),
                max: Duration::from_secs(2),
            }),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJitterRange { .. })));
    }

    #[test]
    fn reject_subsecond_jitter_min() {
        let config = Config {
            jitter: Some(JitterRange {
                min: Duration::from_millis(2),
                max: Duration::from_secs(10),
            }),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJitterRange { .. })));
    }

    #[test]
    fn reject_fractional_jitter_bounds() {
        let config = Config {
            jitter: Some(JitterRange {
                min: Duration::from_secs(2),
                max: Duration::from_millis(9500),
            }),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJitterRange { .. })));
    }

    #[test]
    fn accept_degenerate_jitter_range() {
        let config = Config {
            jitter: Some(JitterRange {
                min: Duration::from_secs(5),
                max: Duration::from_secs(5),
            }),
            ..Config::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn reject_short_refresh_interval() {
        let config =
            Config { refresh_interval: Some(Duration::from_secs(59)), ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::RefreshIntervalTooShort { .. })));
    }

    #[test]
    fn accept_minimum_refresh_interval() {
        let config =
            Config { refresh_interval: Some(MIN_REFRESH_INTERVAL), ..Config::default() };
        assert_eq!(config.validate(), Ok(()));
        assert!(config.ratchet_enabled());
    }

    #[test]
    fn zero_drift_window_is_valid() {
        let config = Config { drift_window: 0, ..Config::default() };
        assert_eq!(config.validate(), Ok(()));
    }
}
