//! Tidelock Cryptographic Primitives
//!
//! Cryptographic building blocks for Tidelock's time-synchronized messaging.
//! Pure functions with deterministic outputs. Callers provide random bytes
//! for deterministic testing.
//!
//! # Key Lifecycle
//!
//! Both parties hold the same 32-byte shared secret and never send it on the
//! wire. From it, a per-slot symmetric key is derived purely from wall-clock
//! time, so no handshake or round trip is needed before the first packet.
//!
//! ```text
//! Shared Secret (generation g)
//!        │
//!        ▼
//! HKDF-SHA256 → Slot Key (per time slot, per context/role)
//!        │
//!        ▼
//! ChaCha20-Poly1305 → Ciphertext + Tag
//! ```
//!
//! The shared secret itself rotates forward through a one-way HMAC chain
//! ([`SecretChain`]), so a compromise of the current generation does not
//! reveal traffic from earlier generations.
//!
//! # Security
//!
//! Determinism:
//! - Same (secret, context, slot, role) always derives the same slot key on
//!   both parties, which is what makes zero-round-trip agreement possible
//! - Slot keys exist only for the duration of one seal/open call
//!
//! Forward Rotation:
//! - `SecretChain::rotate()` replaces the secret via a one-way HMAC step
//! - Exactly one prior generation is retained for the transition window;
//!   older generations cannot be reconstructed from the current state
//!
//! Authenticity:
//! - ChaCha20-Poly1305 AEAD binds slot and sequence into both the nonce and
//!   the associated data
//! - Failed authentication tag -> reject packet

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod error;
pub mod jitter;
pub mod ratchet;
pub mod schedule;

pub use aead::{NONCE_RANDOM_SIZE, TAG_SIZE, open, seal};
pub use error::CryptoError;
pub use jitter::effective_duration_secs;
pub use ratchet::SecretChain;
pub use schedule::{SECRET_SIZE, SlotKey, derive_slot_key};
