//! One-way secret rotation (over-the-air rekeying).
//!
//! # Security Properties
//!
//! - Forward Rotation: each generation is an HMAC step away from the last;
//!   the chain cannot be walked backwards
//! - Two-Generation Window: exactly one prior secret is retained so packets
//!   sealed just before a rotation still open during the transition
//! - Determinism: two parties starting from the same secret reach the same
//!   generation secrets in the same order

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::schedule::SECRET_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Label mixed into every ratchet step
const RATCHET_LABEL: &[u8] = b"otar_ratchet";

/// Forward-rotating chain of shared secrets.
///
/// Holds the current generation's secret, the precomputed next secret, and
/// the immediately prior secret. Time-based rotation policy lives in the
/// protocol layer; this type only performs the deterministic chain steps.
pub struct SecretChain {
    /// Secret of generation `generation - 1`, kept for the transition window
    previous: Option<Zeroizing<[u8; SECRET_SIZE]>>,
    /// Secret of the current generation
    current: Zeroizing<[u8; SECRET_SIZE]>,
    /// Precomputed secret of generation `generation + 1`
    next: Zeroizing<[u8; SECRET_SIZE]>,
    /// Current generation counter, starts at 0 and only moves forward
    generation: u64,
}

impl SecretChain {
    /// Create a chain at generation 0 from the bootstrap secret.
    pub fn new(secret: &[u8; SECRET_SIZE]) -> Self {
        let next = derive_next_secret(secret, 1);
        Self {
            previous: None,
            current: Zeroizing::new(*secret),
            next: Zeroizing::new(next),
            generation: 0,
        }
    }

    /// Current generation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// One-byte wire marker for the current generation.
    pub fn marker(&self) -> u8 {
        (self.generation % 256) as u8
    }

    /// Secret of the current generation.
    pub fn current(&self) -> &[u8; SECRET_SIZE] {
        &self.current
    }

    /// Resolve the secret for a packet's generation marker.
    ///
    /// Returns the current secret for the current marker and the retained
    /// prior secret for the immediately preceding marker. Any other marker
    /// yields `None`: older generations are unreachable because the chain is
    /// one-way, and future generations have not been rotated to yet.
    pub fn secret_for_marker(&self, marker: u8) -> Option<&[u8; SECRET_SIZE]> {
        if marker == self.marker() {
            return Some(&self.current);
        }
        if marker == self.marker().wrapping_sub(1) {
            return self.previous.as_deref();
        }
        None
    }

    /// Advance the chain one generation.
    ///
    /// The current secret becomes the retained prior secret, the precomputed
    /// next secret becomes current, and a fresh next secret is derived. The
    /// previously retained secret is zeroized on drop.
    pub fn rotate(&mut self) {
        let new_current = self.next.clone();
        let new_next = derive_next_secret(&new_current, self.generation + 2);

        self.previous = Some(std::mem::replace(&mut self.current, new_current));
        self.next = Zeroizing::new(new_next);
        self.generation += 1;
    }
}

/// Derive the secret of `generation` from its predecessor.
///
/// `S_g = HMAC-SHA256(S_{g-1}, "otar_ratchet" || g_be64)`
fn derive_next_secret(secret: &[u8; SECRET_SIZE], generation: u64) -> [u8; SECRET_SIZE] {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(RATCHET_LABEL);
    mac.update(&generation.to_be_bytes());
    let result = mac.finalize().into_bytes();

    let mut next = [0u8; SECRET_SIZE];
    next.copy_from_slice(&result);
    next
}
