//! Tidelock Protocol Core
//!
//! Time-synchronized, zero-round-trip authenticated messaging. Two parties
//! sharing a 32-byte secret derive identical ephemeral keys purely from
//! wall-clock time: no handshake, no key exchange, no state on the wire
//! beyond a small clear (but authenticated) header.
//!
//! # Message Flow
//!
//! ```text
//! sender                              receiver
//! ──────                              ────────
//! slot  = normalize(now / duration)   decode packet
//! seq   = counter.next(slot)          resolve generation secret
//! key   = HKDF(secret, ctx, slot)     check slot ∈ drift window
//! seal(key, plaintext)                key = HKDF(secret, ctx, slot)
//! encode packet ──────────────────▶   open(key, ciphertext)
//!                                     replay check, then accept
//! ```
//!
//! Clock skew is absorbed by a configurable drift window, replays are
//! rejected from bounded per-slot state, and the shared secret rotates
//! forward through a one-way ratchet with a short dual-generation
//! acceptance window ([`Config::refresh_interval`]).
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tidelock_core::{Channel, Config, ManualEnvironment};
//!
//! let secret = [7u8; 32];
//! let env = ManualEnvironment::new(Duration::from_secs(1_700_000_000), 1);
//!
//! let alice = Channel::with_env(&secret, Config::default(), env.clone()).unwrap();
//! let bob = Channel::with_env(&secret, Config::default(), env.clone()).unwrap();
//!
//! let packet = alice.seal(b"ping", b"");
//! assert_eq!(bob.open(&packet, b"").unwrap(), b"ping");
//!
//! // A byte-identical replay is rejected
//! assert!(bob.open(&packet, b"").is_err());
//! ```
//!
//! # Security
//!
//! - Per-packet failures are a single opaque [`OpenError`]: callers (and
//!   peers) cannot distinguish a bad tag from a drifted slot or a replay
//! - Replay state and the ratchet live behind one lock per channel; a
//!   channel is safe to share across transport connections
//! - The prime slot-normalization strategies are deterministic index
//!   transforms only; nothing here relies on them for security

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
pub mod config;
pub mod counter;
pub mod env;
pub mod error;
pub mod normalize;
pub mod oneshot;
pub mod replay;
pub mod slots;

pub use channel::{Channel, generate_secret};
pub use config::{
    Config, DEFAULT_CONTEXT, DEFAULT_DRIFT_WINDOW, DEFAULT_SLOT_DURATION, JitterRange,
    MIN_REFRESH_INTERVAL,
};
pub use counter::MessageCounter;
pub use env::{Environment, ManualEnvironment, SystemEnvironment};
pub use error::{ConfigError, OpenError};
pub use normalize::PrimeStrategy;
pub use oneshot::{open_packet, seal_packet};
pub use replay::ReplayGuard;
