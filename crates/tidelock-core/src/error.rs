//! Error types for the Tidelock protocol core.
//!
//! Two very different families live here. Configuration errors are fatal,
//! fully detailed, and surface at construction. Per-packet errors collapse
//! into one opaque [`OpenError`]: a peer that could distinguish "bad tag"
//! from "wrong slot" from "replay" would have a decryption oracle, so the
//! detailed [`RejectReason`] stays inside the crate for logging and tests.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while validating a channel configuration.
///
/// These are programming or deployment mistakes. They are never produced by
/// remote input and must surface immediately at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Shared secret is not exactly 32 bytes
    #[error("shared secret must be exactly 32 bytes, got {actual}")]
    InvalidSecretLength {
        /// Length of the secret that was supplied
        actual: usize,
    },

    /// Slot duration is below one second or not a whole number of seconds
    #[error("slot duration must be a whole number of seconds, at least 1, got {duration:?}")]
    InvalidSlotDuration {
        /// Duration that was supplied
        duration: Duration,
    },

    /// Jitter range is empty or starts below one second
    #[error("invalid jitter range: min {min:?}, max {max:?}")]
    InvalidJitterRange {
        /// Lower bound that was supplied
        min: Duration,
        /// Upper bound that was supplied
        max: Duration,
    },

    /// Secret refresh interval is below the allowed minimum
    #[error("refresh interval must be at least 60 seconds, got {interval:?}")]
    RefreshIntervalTooShort {
        /// Interval that was supplied
        interval: Duration,
    },
}

/// Internal reason a packet was rejected.
///
/// Crate-visible only. Callers see the opaque [`OpenError`]; these kinds
/// feed `tracing` output and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectReason {
    /// Packet shorter than the minimum header
    Malformed,
    /// Normalized slot outside the receiver's drift window
    SlotOutOfWindow,
    /// (slot, sequence) already accepted once
    ReplayDetected,
    /// AEAD tag verification failed
    AuthenticationFailure,
    /// Generation marker is neither current nor immediately prior
    GenerationMismatch,
}

/// Opaque per-packet failure returned by `Channel::open`.
///
/// Every rejected packet produces the same externally observable error; the
/// caller's only sensible reaction is to drop the packet. Failures are never
/// retried: a replayed, drifted, or forged packet stays invalid forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenError {
    kind: RejectReason,
}

impl OpenError {
    pub(crate) fn new(kind: RejectReason) -> Self {
        Self { kind }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn kind(&self) -> RejectReason {
        self.kind
    }
}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Deliberately reason-free; see the type-level docs
        f.write_str("packet rejected")
    }
}

impl std::error::Error for OpenError {}

impl From<tidelock_proto::ProtocolError> for OpenError {
    fn from(_: tidelock_proto::ProtocolError) -> Self {
        Self::new(RejectReason::Malformed)
    }
}
