//! Error types for wire-format parsing.
//!
//! These are structural errors only: a packet that parses cleanly may still
//! be rejected later by the drift-window, replay, or authentication checks.
//! The protocol layer collapses all of them into one opaque rejection.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while decoding a packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than the minimum header
    #[error("packet too short: need at least {expected} bytes, got {actual}")]
    PacketTooShort {
        /// Minimum length for this packet format
        expected: usize,
        /// Length of the buffer that was supplied
        actual: usize,
    },
}
