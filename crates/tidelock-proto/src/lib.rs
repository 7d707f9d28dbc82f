//! Tidelock Wire Format
//!
//! Fixed-layout binary framing for time-synchronized packets. A packet is
//! a small big-endian header followed by the AEAD ciphertext:
//!
//! ```text
//! [generation: 1 byte]?  present only when secret rotation is enabled
//! [slot:       8 bytes]  normalized time slot, big-endian
//! [sequence:   8 bytes]  per-slot message counter, big-endian
//! [random:     4 bytes]  fresh nonce material
//! [ciphertext + tag]     variable, includes the 16-byte Poly1305 tag
//! ```
//!
//! No compression, no extensions, no optional fields beyond the generation
//! marker. The header travels in the clear but is authenticated: the crypto
//! layer binds slot and sequence as associated data, so a modified header
//! fails the tag check.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod packet;

pub use errors::{ProtocolError, Result};
pub use packet::{HEADER_SIZE, NONCE_RANDOM_SIZE, Packet, PacketHeader};
