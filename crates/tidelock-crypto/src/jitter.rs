//! Deterministic slot-duration jitter.
//!
//! When jitter is enabled, the slot duration varies per epoch within a
//! configured range. Both parties compute the duration from the shared
//! secret alone, so they stay synchronized without exchanging anything:
//! the seed is an HMAC of (secret, epoch) and the selection comes from a
//! ChaCha20 keystream, keeping the schedule unpredictable to anyone
//! without the secret.

use chacha20::{
    ChaCha20,
    cipher::{KeyIvInit, StreamCipher},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::schedule::SECRET_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Label mixed into the jitter seed derivation
const JITTER_LABEL: &[u8] = b"slot_jitter";

/// Compute the effective slot duration (in whole seconds) for an epoch.
///
/// Seed = HMAC-SHA256(secret, "slot_jitter" || epoch_be64); the first four
/// ChaCha20 keystream bytes under that seed are reduced into
/// `[min_secs, max_secs]`. Deterministic: same secret and epoch always
/// produce the same duration on both parties.
///
/// Callers must guarantee `1 <= min_secs <= max_secs` (enforced by the
/// protocol layer's configuration validation).
pub fn effective_duration_secs(
    secret: &[u8; SECRET_SIZE],
    epoch: u64,
    min_secs: u64,
    max_secs: u64,
) -> u64 {
    debug_assert!(min_secs >= 1 && min_secs <= max_secs, "validated at configuration time");

    let seed = derive_jitter_seed(secret, epoch);
    let word = keystream_word(&seed);

    let span = max_secs - min_secs + 1;
    min_secs + u64::from(word) % span
}

/// Derive the 32-byte jitter seed for an epoch.
fn derive_jitter_seed(secret: &[u8; SECRET_SIZE], epoch: u64) -> Zeroizing<[u8; 32]> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(JITTER_LABEL);
    mac.update(&epoch.to_be_bytes());
    let result = mac.finalize().into_bytes();

    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&result);
    seed
}

/// First keystream word of ChaCha20 under the seed (zero nonce).
///
/// The nonce is fixed because every seed is used for exactly one word.
fn keystream_word(seed: &[u8; 32]) -> u32 {
    let mut cipher = ChaCha20::new(seed.into(), &[0u8; 12].into());
    let mut word = [0u8; 4];
    cipher.apply_keystream(&mut word);
    u32::from_be_bytes(word)
}
