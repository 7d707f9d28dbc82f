//! Packet type with fixed big-endian encoding.

use bytes::{BufMut, Bytes};

use crate::errors::{ProtocolError, Result};

/// Size of the fixed header without the generation marker (20 bytes)
pub const HEADER_SIZE: usize = 20;

/// Size of the random nonce material carried in the header (4 bytes)
pub const NONCE_RANDOM_SIZE: usize = 4;

/// Clear-text packet header.
///
/// Created once by the sender at seal time and parsed read-only at open
/// time. The `generation` marker is present exactly when the channel has
/// secret rotation enabled; both sides must agree on that, since the formats
/// are not self-describing.
///
/// # Invariants
///
/// - The slot is already normalized by the sender; receivers never
///   re-normalize it
/// - (slot, sequence) is unique per channel and secret generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Secret generation marker (low 8 bits of the generation counter)
    pub generation: Option<u8>,
    /// Normalized time slot the packet was sealed for
    pub slot: u64,
    /// Per-slot sequence number
    pub sequence: u64,
    /// Fresh random nonce material
    pub nonce_random: [u8; NONCE_RANDOM_SIZE],
}

impl PacketHeader {
    /// Encoded size of this header: 20 bytes, plus 1 for the generation
    /// marker when present.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + usize::from(self.generation.is_some())
    }
}

/// Complete wire packet: header plus AEAD ciphertext-with-tag.
///
/// This is a pure data holder. Key derivation and tag verification happen
/// in the protocol layer; `decode` only validates structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Clear-text header
    pub header: PacketHeader,
    /// Ciphertext including the 16-byte Poly1305 tag
    pub ciphertext: Bytes,
}

impl Packet {
    /// Create a packet from header fields and ciphertext.
    #[must_use]
    pub fn new(header: PacketHeader, ciphertext: impl Into<Bytes>) -> Self {
        Self { header, ciphertext: ciphertext.into() }
    }

    /// Total encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        self.header.encoded_len() + self.ciphertext.len()
    }

    /// Encode the packet into a buffer.
    ///
    /// Writes `[generation]? [slot][sequence][random][ciphertext]`, all
    /// multi-byte fields big-endian. Infallible: every header is encodable.
    pub fn encode(&self, dst: &mut impl BufMut) {
        if let Some(generation) = self.header.generation {
            dst.put_u8(generation);
        }
        dst.put_u64(self.header.slot);
        dst.put_u64(self.header.sequence);
        dst.put_slice(&self.header.nonce_random);
        dst.put_slice(&self.ciphertext);
    }

    /// Encode the packet into a fresh byte vector.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf
    }

    /// Decode a packet from wire bytes.
    ///
    /// `with_generation` selects the 21-byte format carrying the generation
    /// marker; the caller knows which format its channel speaks. Everything
    /// after the header is taken as ciphertext, so an empty ciphertext
    /// decodes fine here and fails later at tag verification.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PacketTooShort` if the buffer cannot hold the header
    pub fn decode(bytes: &[u8], with_generation: bool) -> Result<Self> {
        let min_len = HEADER_SIZE + usize::from(with_generation);
        if bytes.len() < min_len {
            return Err(ProtocolError::PacketTooShort { expected: min_len, actual: bytes.len() });
        }

        let (generation, rest) = if with_generation {
            (Some(bytes[0]), &bytes[1..])
        } else {
            (None, bytes)
        };

        let mut slot_bytes = [0u8; 8];
        slot_bytes.copy_from_slice(&rest[0..8]);
        let mut sequence_bytes = [0u8; 8];
        sequence_bytes.copy_from_slice(&rest[8..16]);
        let mut nonce_random = [0u8; NONCE_RANDOM_SIZE];
        nonce_random.copy_from_slice(&rest[16..HEADER_SIZE]);

        let header = PacketHeader {
            generation,
            slot: u64::from_be_bytes(slot_bytes),
            sequence: u64::from_be_bytes(sequence_bytes),
            nonce_random,
        };

        Ok(Self { header, ciphertext: Bytes::copy_from_slice(&rest[HEADER_SIZE..]) })
    }
}
