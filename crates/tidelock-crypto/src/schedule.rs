//! Per-slot key derivation using HKDF-SHA256.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// Required length of the shared secret in bytes.
pub const SECRET_SIZE: usize = 32;

/// A symmetric key derived for a single time slot.
///
/// Valid for exactly one seal or open call and discarded afterwards.
/// Never cache a slot key across calls: a ratchet rotation must immediately
/// change the keys both parties derive.
#[derive(Clone)]
pub struct SlotKey {
    /// The 32-byte symmetric key for ChaCha20-Poly1305
    key: [u8; 32],
}

impl SlotKey {
    /// 32-byte symmetric key for ChaCha20-Poly1305 AEAD.
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }
}

// Implement Drop to zeroize key material
impl Drop for SlotKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive the symmetric key for one time slot.
///
/// The info parameter is `context || slot (big-endian u64) || role`, so two
/// parties derive identical keys exactly when they agree on all four inputs.
/// The optional role tag separates directions or channels sharing one secret.
///
/// # Security
///
/// - Different slots produce unrelated keys (key rotates every slot)
/// - Different contexts produce unrelated keys (application separation)
/// - Deterministic: same inputs always produce same output
pub fn derive_slot_key(
    secret: &[u8; SECRET_SIZE],
    context: &[u8],
    slot: u64,
    role: Option<&[u8]>,
) -> SlotKey {
    let hkdf = Hkdf::<Sha256>::new(None, secret);

    // Build the info parameter: context || slot || optional role tag
    let mut info = Vec::with_capacity(context.len() + 8 + role.map_or(0, <[u8]>::len));
    info.extend_from_slice(context);
    info.extend_from_slice(&slot.to_be_bytes());
    if let Some(role) = role {
        info.extend_from_slice(role);
    }

    let mut key = [0u8; 32];
    let Ok(()) = hkdf.expand(&info, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    SlotKey { key }
}
