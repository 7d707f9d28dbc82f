//! Wall-clock to slot-index mapping.
//!
//! A slot is `floor(unix_seconds / effective_duration)`. With jitter
//! disabled the effective duration is the configured constant; with jitter
//! enabled it varies per hour-long epoch, selected by a PRF over the shared
//! secret so both parties agree without communicating.
//!
//! When the effective duration changes at an epoch boundary, the slot
//! index jumps discontinuously (the whole timeline is re-bucketed), so
//! skewed peers straddling the boundary disagree by far more than any
//! drift window and drop each other's packets until both have crossed.
//! This desync lasts at most the configured skew and is an accepted cost
//! of the jitter scheme.

use std::time::Duration;

use tidelock_crypto::effective_duration_secs;

use crate::config::Config;

/// Duration of one jitter epoch (1 hour).
///
/// Fixed by the protocol: both parties must bucket time identically for the
/// jitter PRF to agree.
pub const JITTER_EPOCH_SECS: u64 = 3600;

/// Compute the raw (un-normalized) slot index for a wall-clock time.
///
/// `secret` is the jitter PRF key and is only touched when jitter is
/// enabled. Pure function of its inputs.
pub fn raw_slot_at(secret: &[u8; 32], config: &Config, now: Duration) -> u64 {
    let secs = now.as_secs();
    let duration = match config.jitter {
        None => config.slot_duration.as_secs(),
        Some(range) => {
            let epoch = secs / JITTER_EPOCH_SECS;
            effective_duration_secs(secret, epoch, range.min.as_secs(), range.max.as_secs())
        }
    };

    // Config validation guarantees duration >= 1
    secs / duration.max(1)
}
