//! Packet sealing and opening with ChaCha20-Poly1305.
//!
//! All functions are pure - random bytes must be provided by the caller.
//! This enables deterministic testing and keeps the protocol layer in charge
//! of entropy.

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::{error::CryptoError, schedule::SlotKey};

/// Size of the random suffix in the nonce (4 bytes)
pub const NONCE_RANDOM_SIZE: usize = 4;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Encrypt and authenticate a payload for one (slot, sequence) pair.
///
/// Returns the ciphertext with the 16-byte Poly1305 tag appended. The caller
/// transmits `(slot, sequence, nonce_random, ciphertext)`; the plaintext and
/// the key never leave this function.
///
/// # Security
///
/// - Nonce is unique per (slot, sequence, random) under one key
/// - The full 64-bit slot and sequence are bound as associated data, so a
///   packet cannot be replayed under a different header even where the low
///   32 nonce bits would collide
/// - Caller MUST provide cryptographically secure random bytes in production
pub fn seal(
    key: &SlotKey,
    plaintext: &[u8],
    slot: u64,
    sequence: u64,
    associated_data: &[u8],
    nonce_random: [u8; NONCE_RANDOM_SIZE],
) -> Vec<u8> {
    let nonce = build_nonce(slot, sequence, nonce_random);
    let aad = build_aad(slot, sequence, associated_data);
    let cipher = ChaCha20Poly1305::new(key.key().into());

    let Ok(ciphertext) =
        cipher.encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad: &aad })
    else {
        unreachable!("ChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    ciphertext
}

/// Decrypt and verify a payload for one (slot, sequence) pair.
///
/// Reconstructs the same nonce and associated data as [`seal`] and returns
/// the plaintext.
///
/// # Errors
///
/// - `AuthenticationFailure` on any tag mismatch. Wrong key, wrong header
///   fields, and tampered ciphertext are indistinguishable here.
pub fn open(
    key: &SlotKey,
    ciphertext: &[u8],
    slot: u64,
    sequence: u64,
    associated_data: &[u8],
    nonce_random: [u8; NONCE_RANDOM_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    let nonce = build_nonce(slot, sequence, nonce_random);
    let aad = build_aad(slot, sequence, associated_data);
    let cipher = ChaCha20Poly1305::new(key.key().into());

    cipher
        .decrypt(Nonce::from_slice(&nonce), Payload { msg: ciphertext, aad: &aad })
        .map_err(|_| CryptoError::AuthenticationFailure)
}

/// Build a 12-byte nonce for ChaCha20-Poly1305.
///
/// Structure:
/// - bytes 0-3: slot, low 32 bits (big-endian)
/// - bytes 4-7: sequence, low 32 bits (big-endian)
/// - bytes 8-11: random suffix (caller-provided)
///
/// The truncation to 32 bits is safe because the full slot and sequence are
/// authenticated via the associated data.
fn build_nonce(slot: u64, sequence: u64, random_suffix: [u8; NONCE_RANDOM_SIZE]) -> [u8; 12] {
    let mut nonce = [0u8; 12];

    nonce[0..4].copy_from_slice(&(slot as u32).to_be_bytes());
    nonce[4..8].copy_from_slice(&(sequence as u32).to_be_bytes());
    nonce[8..12].copy_from_slice(&random_suffix);

    nonce
}

/// Build the associated data: full slot || full sequence || caller AAD.
fn build_aad(slot: u64, sequence: u64, associated_data: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(16 + associated_data.len());
    aad.extend_from_slice(&slot.to_be_bytes());
    aad.extend_from_slice(&sequence.to_be_bytes());
    aad.extend_from_slice(associated_data);
    aad
}
